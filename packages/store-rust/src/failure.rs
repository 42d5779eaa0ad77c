//! Walking a failed unit of work's journal.
//!
//! [`handle_failure`] visits every journaled operation in attempt order and
//! hands each one, already narrowed, to a [`FailureHandler`]. What the
//! handler does (compensate, log, collect for retry) is its own business.
//! A rejection from one entry is logged and recorded in the
//! [`FailureReport`]; walking always continues with the next entry.

use tracing::{error, info};
use tuplegrid_core::{
    CreateByKey, FrozenJournal, InsertOrUpdateAssociation, InsertOrUpdateTuple, InsertWithShape,
    Operation, OperationError, OperationKind, OperationVisitor, RemoveAssociation, RemoveTuple,
};

/// Why a handler did not accept a journal entry.
#[derive(Debug, thiserror::Error)]
pub enum FailureHandlingError {
    /// The handler cannot deal with this kind of operation.
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error("failure handler error: {0:#}")]
    Handler(anyhow::Error),
}

impl From<anyhow::Error> for FailureHandlingError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<OperationError>() {
            Ok(op_err) => FailureHandlingError::Operation(op_err),
            Err(other) => FailureHandlingError::Handler(other),
        }
    }
}

fn unhandled(kind: OperationKind) -> anyhow::Error {
    OperationError::UnknownKind { kind }.into()
}

/// Consumer of a failed unit of work's journal.
///
/// Each method receives the entry's journal position and the narrowed
/// operation. Unimplemented methods reject the entry with
/// [`OperationError::UnknownKind`].
pub trait FailureHandler {
    fn on_create_by_key(&mut self, position: usize, op: &CreateByKey) -> anyhow::Result<()> {
        let _ = (position, op);
        Err(unhandled(OperationKind::CreateByKey))
    }

    fn on_insert_with_shape(&mut self, position: usize, op: &InsertWithShape) -> anyhow::Result<()> {
        let _ = (position, op);
        Err(unhandled(OperationKind::InsertWithShape))
    }

    fn on_insert_or_update_tuple(
        &mut self,
        position: usize,
        op: &InsertOrUpdateTuple,
    ) -> anyhow::Result<()> {
        let _ = (position, op);
        Err(unhandled(OperationKind::InsertOrUpdateTuple))
    }

    fn on_remove_tuple(&mut self, position: usize, op: &RemoveTuple) -> anyhow::Result<()> {
        let _ = (position, op);
        Err(unhandled(OperationKind::RemoveTuple))
    }

    fn on_insert_or_update_association(
        &mut self,
        position: usize,
        op: &InsertOrUpdateAssociation,
    ) -> anyhow::Result<()> {
        let _ = (position, op);
        Err(unhandled(OperationKind::InsertOrUpdateAssociation))
    }

    fn on_remove_association(
        &mut self,
        position: usize,
        op: &RemoveAssociation,
    ) -> anyhow::Result<()> {
        let _ = (position, op);
        Err(unhandled(OperationKind::RemoveAssociation))
    }
}

struct Dispatch<'a, H: ?Sized> {
    handler: &'a mut H,
    position: usize,
}

impl<H: FailureHandler + ?Sized> OperationVisitor for Dispatch<'_, H> {
    type Output = anyhow::Result<()>;

    fn visit_create_by_key(&mut self, op: &CreateByKey) -> Self::Output {
        self.handler.on_create_by_key(self.position, op)
    }

    fn visit_insert_with_shape(&mut self, op: &InsertWithShape) -> Self::Output {
        self.handler.on_insert_with_shape(self.position, op)
    }

    fn visit_insert_or_update_tuple(&mut self, op: &InsertOrUpdateTuple) -> Self::Output {
        self.handler.on_insert_or_update_tuple(self.position, op)
    }

    fn visit_remove_tuple(&mut self, op: &RemoveTuple) -> Self::Output {
        self.handler.on_remove_tuple(self.position, op)
    }

    fn visit_insert_or_update_association(
        &mut self,
        op: &InsertOrUpdateAssociation,
    ) -> Self::Output {
        self.handler
            .on_insert_or_update_association(self.position, op)
    }

    fn visit_remove_association(&mut self, op: &RemoveAssociation) -> Self::Output {
        self.handler.on_remove_association(self.position, op)
    }
}

/// What happened to one journal entry.
#[derive(Debug)]
pub struct EntryOutcome {
    pub position: usize,
    pub kind: OperationKind,
    /// Textual form of the operation, for diagnostics.
    pub representation: String,
    pub result: Result<(), FailureHandlingError>,
}

impl EntryOutcome {
    #[must_use]
    pub fn is_handled(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-entry outcomes of [`handle_failure`], in journal order.
#[derive(Debug, Default)]
pub struct FailureReport {
    outcomes: Vec<EntryOutcome>,
}

impl FailureReport {
    #[must_use]
    pub fn outcomes(&self) -> &[EntryOutcome] {
        &self.outcomes
    }

    pub fn handled(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| o.is_handled())
    }

    pub fn rejected(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|o| !o.is_handled())
    }

    /// `true` if the handler accepted every entry.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(EntryOutcome::is_handled)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

fn dispatch<H: FailureHandler + ?Sized>(
    handler: &mut H,
    position: usize,
    op: &Operation,
) -> Result<(), FailureHandlingError> {
    op.accept(&mut Dispatch { handler, position })
        .map_err(FailureHandlingError::from)
}

/// Walks `journal` in attempt order, handing each entry to `handler`.
pub fn handle_failure<H: FailureHandler + ?Sized>(
    journal: &FrozenJournal,
    handler: &mut H,
) -> FailureReport {
    let mut outcomes = Vec::with_capacity(journal.len());
    for (position, op) in journal.iter().enumerate() {
        let result = dispatch(handler, position, op);
        if let Err(err) = &result {
            error!(
                position,
                kind = %op.kind(),
                operation = %op,
                error = %err,
                "failure handler rejected journaled operation"
            );
        }
        outcomes.push(EntryOutcome {
            position,
            kind: op.kind(),
            representation: op.to_string(),
            result,
        });
    }
    FailureReport { outcomes }
}

/// Handler that logs every entry and accepts all kinds.
#[derive(Debug, Default)]
pub struct LoggingFailureHandler {
    seen: usize,
}

impl LoggingFailureHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries logged so far.
    #[must_use]
    pub fn seen(&self) -> usize {
        self.seen
    }

    fn log(&mut self, position: usize, op: &dyn std::fmt::Display) {
        self.seen += 1;
        info!(position, operation = %op, "journaled operation");
    }
}

impl FailureHandler for LoggingFailureHandler {
    fn on_create_by_key(&mut self, position: usize, op: &CreateByKey) -> anyhow::Result<()> {
        self.log(position, op);
        Ok(())
    }

    fn on_insert_with_shape(&mut self, position: usize, op: &InsertWithShape) -> anyhow::Result<()> {
        self.log(position, op);
        Ok(())
    }

    fn on_insert_or_update_tuple(
        &mut self,
        position: usize,
        op: &InsertOrUpdateTuple,
    ) -> anyhow::Result<()> {
        self.log(position, op);
        Ok(())
    }

    fn on_remove_tuple(&mut self, position: usize, op: &RemoveTuple) -> anyhow::Result<()> {
        self.log(position, op);
        Ok(())
    }

    fn on_insert_or_update_association(
        &mut self,
        position: usize,
        op: &InsertOrUpdateAssociation,
    ) -> anyhow::Result<()> {
        self.log(position, op);
        Ok(())
    }

    fn on_remove_association(
        &mut self,
        position: usize,
        op: &RemoveAssociation,
    ) -> anyhow::Result<()> {
        self.log(position, op);
        Ok(())
    }
}
