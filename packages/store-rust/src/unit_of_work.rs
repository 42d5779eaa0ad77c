//! Executes operations against a dialect while journaling every attempt.
//!
//! A [`UnitOfWork`] owns one [`OperationJournal`]. Attempts are serialized,
//! so journal order is attempt order even when `execute` is called from
//! concurrent futures. The first failure aborts the unit: later operations
//! are refused without being attempted or journaled, and
//! [`UnitOfWork::finish`] hands the frozen journal back inside a
//! [`PartialFailure`] for a failure handler to walk.
//!
//! An attempt whose future is dropped before the dialect answers (a
//! timeout, a losing `select!` branch, an aborted task) is still journaled
//! and counts as a failure, since the store may already hold its write.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use tuplegrid_core::{FrozenJournal, Operation, OperationJournal, OperationKind};

use crate::dialect::{apply, GridDialect};

/// Errors returned by [`UnitOfWork::execute`].
#[derive(Debug, thiserror::Error)]
pub enum UnitOfWorkError {
    #[error("operation {position} ({kind}) failed")]
    OperationFailed {
        position: usize,
        kind: OperationKind,
        #[source]
        source: anyhow::Error,
    },
    #[error("unit of work aborted by an earlier failure; operation not attempted")]
    Aborted,
}

const INTERRUPTED_CAUSE: &str = "attempt interrupted before the dialect answered";

/// A failed attempt, as recorded by the unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFailure {
    pub position: usize,
    pub kind: OperationKind,
    /// Rendered error chain of the cause.
    pub cause: String,
    /// The attempt never completed; its effect on the store is unknown.
    pub interrupted: bool,
}

impl RecordedFailure {
    fn pending(position: usize, kind: OperationKind) -> Self {
        Self {
            position,
            kind,
            cause: INTERRUPTED_CAUSE.to_string(),
            interrupted: true,
        }
    }
}

impl fmt::Display for RecordedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.position, self.kind, self.cause)
    }
}

/// A unit of work that did not complete; carries everything it attempted.
#[derive(Debug, thiserror::Error)]
#[error(
    "unit of work failed: {} operation(s) journaled, {} failed",
    .journal.len(),
    .failures.len()
)]
pub struct PartialFailure {
    journal: FrozenJournal,
    failures: Vec<RecordedFailure>,
}

impl PartialFailure {
    /// Every attempted operation in attempt order, the failing ones included.
    #[must_use]
    pub fn journal(&self) -> &FrozenJournal {
        &self.journal
    }

    #[must_use]
    pub fn failures(&self) -> &[RecordedFailure] {
        &self.failures
    }

    #[must_use]
    pub fn into_parts(self) -> (FrozenJournal, Vec<RecordedFailure>) {
        (self.journal, self.failures)
    }
}

/// Operation of the attempt in progress. Journaled when dropped, so the
/// entry is written on every exit path, cancellation included.
struct InFlight<'a> {
    journal: &'a OperationJournal,
    op: Option<Operation>,
}

impl InFlight<'_> {
    async fn run(&self, dialect: &dyn GridDialect) -> anyhow::Result<()> {
        match &self.op {
            Some(op) => apply(dialect, op).await,
            None => Ok(()),
        }
    }

    fn describe(&self) -> String {
        self.op.as_ref().map(ToString::to_string).unwrap_or_default()
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(op) = self.op.take() {
            self.journal.append(op);
        }
    }
}

/// Scope in which store operations are attempted and journaled.
pub struct UnitOfWork {
    dialect: Arc<dyn GridDialect>,
    journal: OperationJournal,
    // Held for the whole attempt; also serializes attempts.
    failures: Mutex<Vec<RecordedFailure>>,
}

impl UnitOfWork {
    #[must_use]
    pub fn new(dialect: Arc<dyn GridDialect>) -> Self {
        debug!(dialect = dialect.name(), "unit of work started");
        Self {
            dialect,
            journal: OperationJournal::new(),
            failures: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn dialect(&self) -> &Arc<dyn GridDialect> {
        &self.dialect
    }

    /// Number of operations journaled so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.journal.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    /// Attempts `op` against the dialect and journals it, returning its
    /// journal position.
    ///
    /// The operation is journaled whether or not it succeeds, and also when
    /// the returned future is dropped mid-attempt; in that case the unit is
    /// left failed with an interrupted [`RecordedFailure`].
    ///
    /// # Errors
    ///
    /// [`UnitOfWorkError::OperationFailed`] if the dialect rejects `op`;
    /// [`UnitOfWorkError::Aborted`] if an earlier operation already failed.
    pub async fn execute(&self, op: impl Into<Operation>) -> Result<usize, UnitOfWorkError> {
        let op = op.into();
        let mut failures = self.failures.lock().await;
        if !failures.is_empty() {
            debug!(kind = %op.kind(), "unit of work aborted, operation refused");
            return Err(UnitOfWorkError::Aborted);
        }

        // Attempts hold the lock, so nothing else appends before `in_flight`.
        let kind = op.kind();
        let position = self.journal.len();
        failures.push(RecordedFailure::pending(position, kind));
        let in_flight = InFlight {
            journal: &self.journal,
            op: Some(op),
        };

        let result = in_flight.run(self.dialect.as_ref()).await;
        failures.pop();
        match result {
            Ok(()) => {
                drop(in_flight);
                Ok(position)
            }
            Err(source) => {
                let operation = in_flight.describe();
                drop(in_flight);
                warn!(
                    position,
                    %kind,
                    %operation,
                    dialect = self.dialect.name(),
                    error = %source,
                    "operation failed, aborting unit of work"
                );
                failures.push(RecordedFailure {
                    position,
                    kind,
                    cause: format!("{source:#}"),
                    interrupted: false,
                });
                Err(UnitOfWorkError::OperationFailed {
                    position,
                    kind,
                    source,
                })
            }
        }
    }

    /// Ends the unit of work.
    ///
    /// On success the journal is discarded.
    ///
    /// # Errors
    ///
    /// Returns a [`PartialFailure`] carrying the frozen journal if any
    /// operation failed.
    pub fn finish(self) -> Result<(), PartialFailure> {
        let failures = self.failures.into_inner();
        let journal = self.journal.freeze();
        for failure in failures.iter().filter(|f| f.interrupted) {
            warn!(
                position = failure.position,
                kind = %failure.kind,
                "unit of work finished with an interrupted attempt"
            );
        }
        if failures.is_empty() {
            debug!(operations = journal.len(), "unit of work completed");
            return Ok(());
        }
        Err(PartialFailure { journal, failures })
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("dialect", &self.dialect.name())
            .field("journaled", &self.journal.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use proptest::prelude::*;
    use tuplegrid_core::{
        AssociationKey, CreateByKey, EntityKey, EntityKeyMetadata, InsertWithShape,
        OperationError, RemoveTuple, Tuple,
    };

    use super::*;
    use crate::dialects::{HashMapDialect, NullDialect};

    fn order_key(id: i64) -> EntityKey {
        EntityKey::single("Order", "id", id).unwrap()
    }

    fn insert_order(id: i64) -> InsertWithShape {
        let shape = EntityKeyMetadata::new("Order", ["id"]).unwrap();
        InsertWithShape::new(shape, Tuple::new().with("id", id).with("total", 19.99)).unwrap()
    }

    #[tokio::test]
    async fn successful_unit_discards_journal() {
        let dialect = Arc::new(HashMapDialect::new());
        let uow = UnitOfWork::new(dialect.clone());

        assert_eq!(uow.execute(insert_order(1)).await.unwrap(), 0);
        assert_eq!(uow.execute(CreateByKey::new(order_key(2))).await.unwrap(), 1);
        assert_eq!(uow.execute(RemoveTuple::new(order_key(2))).await.unwrap(), 2);
        assert_eq!(uow.len(), 3);

        uow.finish().unwrap();
        assert_eq!(dialect.entity_count(), 1);
    }

    #[tokio::test]
    async fn failure_is_journaled_and_aborts_the_unit() {
        let uow = UnitOfWork::new(Arc::new(HashMapDialect::new()));

        uow.execute(CreateByKey::new(order_key(1))).await.unwrap();
        let err = uow.execute(CreateByKey::new(order_key(1))).await.unwrap_err();
        match &err {
            UnitOfWorkError::OperationFailed {
                position,
                kind,
                source,
            } => {
                assert_eq!(*position, 1);
                assert_eq!(*kind, OperationKind::CreateByKey);
                assert!(source.to_string().contains("already exists"));
            }
            UnitOfWorkError::Aborted => panic!("expected OperationFailed"),
        }

        let refused = uow.execute(RemoveTuple::new(order_key(1))).await.unwrap_err();
        assert!(matches!(refused, UnitOfWorkError::Aborted));
        assert_eq!(uow.len(), 2, "refused operations are not journaled");

        let failure = uow.finish().unwrap_err();
        assert_eq!(
            failure.journal().kinds(),
            vec![OperationKind::CreateByKey, OperationKind::CreateByKey]
        );
        assert_eq!(failure.failures().len(), 1);
        assert_eq!(failure.failures()[0].position, 1);
        assert!(failure.to_string().contains("2 operation(s) journaled, 1 failed"));
    }

    #[tokio::test]
    async fn duplicate_insert_is_recorded_as_failure() {
        let uow = UnitOfWork::new(Arc::new(HashMapDialect::new()));
        uow.execute(insert_order(5)).await.unwrap();
        let err = uow.execute(insert_order(5)).await.unwrap_err();
        assert!(matches!(
            err,
            UnitOfWorkError::OperationFailed {
                kind: OperationKind::InsertWithShape,
                ..
            }
        ));

        let (journal, failures) = uow.finish().unwrap_err().into_parts();
        assert_eq!(journal.len(), 2);
        assert!(failures[0].to_string().starts_with("#1 InsertWithShape: "));
    }

    #[tokio::test]
    async fn error_source_is_not_an_operation_error_for_store_failures() {
        let uow = UnitOfWork::new(Arc::new(HashMapDialect::new()));
        uow.execute(CreateByKey::new(order_key(9))).await.unwrap();
        let err = uow.execute(CreateByKey::new(order_key(9))).await.unwrap_err();
        let UnitOfWorkError::OperationFailed { source, .. } = &err else {
            panic!("expected OperationFailed, got {err:?}");
        };
        assert!(source.downcast_ref::<OperationError>().is_none());
    }

    #[tokio::test]
    async fn concurrent_executes_all_land_in_the_journal() {
        let uow = UnitOfWork::new(Arc::new(NullDialect));

        let (a, b, c) = tokio::join!(
            uow.execute(CreateByKey::new(order_key(1))),
            uow.execute(insert_order(2)),
            uow.execute(RemoveTuple::new(order_key(3))),
        );
        let mut positions = vec![a.unwrap(), b.unwrap(), c.unwrap()];
        positions.sort_unstable();
        assert_eq!(positions, vec![0, 1, 2]);
        assert!(uow.finish().is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn spawned_executes_share_one_unit() {
        let uow = Arc::new(UnitOfWork::new(Arc::new(HashMapDialect::new())));

        let mut handles = Vec::new();
        for id in 0..16_i64 {
            let uow = Arc::clone(&uow);
            handles.push(tokio::spawn(async move {
                uow.execute(CreateByKey::new(order_key(id))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let uow = Arc::try_unwrap(uow).unwrap();
        assert_eq!(uow.len(), 16);
        assert!(uow.finish().is_ok());
    }

    /// Counts its writes, then stalls long enough for callers to give up.
    #[derive(Default)]
    struct StallingDialect {
        writes: AtomicUsize,
    }

    #[async_trait]
    impl GridDialect for StallingDialect {
        fn name(&self) -> &'static str {
            "stalling"
        }

        async fn get_tuple(&self, _key: &EntityKey) -> anyhow::Result<Option<Tuple>> {
            Ok(None)
        }

        async fn create_tuple(&self, _key: &EntityKey) -> anyhow::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }

        async fn insert_tuple(
            &self,
            metadata: &EntityKeyMetadata,
            tuple: &Tuple,
        ) -> anyhow::Result<EntityKey> {
            Ok(metadata.key_from_tuple(tuple)?)
        }

        async fn insert_or_update_tuple(&self, _key: &EntityKey, _tuple: &Tuple) -> anyhow::Result<()> {
            Ok(())
        }

        async fn remove_tuple(&self, _key: &EntityKey) -> anyhow::Result<()> {
            Ok(())
        }

        async fn get_association(&self, _key: &AssociationKey) -> anyhow::Result<Option<Vec<Tuple>>> {
            Ok(None)
        }

        async fn insert_or_update_association(
            &self,
            _key: &AssociationKey,
            _rows: &[Tuple],
        ) -> anyhow::Result<()> {
            Ok(())
        }

        async fn remove_association(&self, _key: &AssociationKey) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn cancelled_attempt_is_journaled_and_fails_the_unit() {
        let dialect = Arc::new(StallingDialect::default());
        let uow = UnitOfWork::new(dialect.clone());
        uow.execute(RemoveTuple::new(order_key(1))).await.unwrap();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            uow.execute(CreateByKey::new(order_key(2))),
        )
        .await;
        assert!(timed_out.is_err(), "attempt should still be stalled");
        assert_eq!(dialect.writes.load(Ordering::SeqCst), 1);
        assert_eq!(uow.len(), 2, "the interrupted attempt is journaled");

        let refused = uow.execute(RemoveTuple::new(order_key(3))).await.unwrap_err();
        assert!(matches!(refused, UnitOfWorkError::Aborted));

        let failure = uow.finish().unwrap_err();
        assert_eq!(
            failure.journal().kinds(),
            vec![OperationKind::RemoveTuple, OperationKind::CreateByKey]
        );
        assert_eq!(failure.failures().len(), 1);
        let interrupted = &failure.failures()[0];
        assert_eq!(interrupted.position, 1);
        assert_eq!(interrupted.kind, OperationKind::CreateByKey);
        assert!(interrupted.interrupted);
    }

    #[tokio::test]
    async fn completed_attempts_leave_no_pending_marker() {
        let uow = UnitOfWork::new(Arc::new(HashMapDialect::new()));
        uow.execute(CreateByKey::new(order_key(1))).await.unwrap();
        uow.execute(CreateByKey::new(order_key(1))).await.unwrap_err();

        let failure = uow.finish().unwrap_err();
        assert_eq!(failure.failures().len(), 1);
        assert!(!failure.failures()[0].interrupted);
    }

    proptest! {
        #[test]
        fn unit_stops_at_first_duplicate(ids in proptest::collection::vec(0_i64..8, 1..24)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let first_duplicate = ids
                .iter()
                .enumerate()
                .position(|(i, id)| ids[..i].contains(id));

            let uow = UnitOfWork::new(Arc::new(HashMapDialect::new()));
            runtime.block_on(async {
                for id in &ids {
                    let _ = uow.execute(CreateByKey::new(order_key(*id))).await;
                }
            });

            match first_duplicate {
                None => {
                    prop_assert_eq!(uow.len(), ids.len());
                    prop_assert!(uow.finish().is_ok());
                }
                Some(at) => {
                    prop_assert_eq!(uow.len(), at + 1);
                    let failure = uow.finish().unwrap_err();
                    prop_assert_eq!(failure.failures().len(), 1);
                    prop_assert_eq!(failure.failures()[0].position, at);
                }
            }
        }
    }

    #[test]
    fn debug_names_the_dialect() {
        let uow = UnitOfWork::new(Arc::new(NullDialect));
        let rendered = format!("{uow:?}");
        assert!(rendered.contains("\"null\""));
        assert!(uow.is_empty());
    }
}
