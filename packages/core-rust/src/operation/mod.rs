//! Typed store operations and the handle that carries them.
//!
//! The set of operation kinds is closed:
//!
//! - [`OperationKind`] tags every kind and is the registry consumers
//!   dispatch on;
//! - one variant type per kind (see [`variants`]) holds the operation's
//!   identifying fields;
//! - [`Operation`] is the handle: it owns exactly one variant and recovers it
//!   through [`narrow`](Operation::narrow), [`into_variant`](Operation::into_variant)
//!   or exhaustive dispatch with an [`OperationVisitor`].
//!
//! [`OperationVariant`] is sealed, so no type outside this module can pose
//! as an operation variant. `OperationKind` and `Operation` are
//! `#[non_exhaustive]`: crates matching on them must keep a fallback arm and
//! report kinds they do not know as [`OperationError::UnknownKind`].

use std::fmt;

use crate::error::OperationError;

pub mod variants;

pub use variants::{
    CreateByKey, InsertOrUpdateAssociation, InsertOrUpdateTuple, InsertWithShape,
    RemoveAssociation, RemoveTuple,
};

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

/// Tag identifying which concrete operation a handle holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum OperationKind {
    CreateByKey,
    InsertWithShape,
    InsertOrUpdateTuple,
    RemoveTuple,
    InsertOrUpdateAssociation,
    RemoveAssociation,
}

impl OperationKind {
    /// Every kind, in declaration order.
    pub const ALL: [OperationKind; 6] = [
        OperationKind::CreateByKey,
        OperationKind::InsertWithShape,
        OperationKind::InsertOrUpdateTuple,
        OperationKind::RemoveTuple,
        OperationKind::InsertOrUpdateAssociation,
        OperationKind::RemoveAssociation,
    ];

    /// Stable name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OperationKind::CreateByKey => "CreateByKey",
            OperationKind::InsertWithShape => "InsertWithShape",
            OperationKind::InsertOrUpdateTuple => "InsertOrUpdateTuple",
            OperationKind::RemoveTuple => "RemoveTuple",
            OperationKind::InsertOrUpdateAssociation => "InsertOrUpdateAssociation",
            OperationKind::RemoveAssociation => "RemoveAssociation",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// Handle over exactly one operation variant.
///
/// Not `Clone`: a handle belongs to a single journal entry.
#[derive(Debug)]
#[non_exhaustive]
pub enum Operation {
    CreateByKey(CreateByKey),
    InsertWithShape(InsertWithShape),
    InsertOrUpdateTuple(InsertOrUpdateTuple),
    RemoveTuple(RemoveTuple),
    InsertOrUpdateAssociation(InsertOrUpdateAssociation),
    RemoveAssociation(RemoveAssociation),
}

impl Operation {
    /// Kind of the held variant.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateByKey(_) => OperationKind::CreateByKey,
            Operation::InsertWithShape(_) => OperationKind::InsertWithShape,
            Operation::InsertOrUpdateTuple(_) => OperationKind::InsertOrUpdateTuple,
            Operation::RemoveTuple(_) => OperationKind::RemoveTuple,
            Operation::InsertOrUpdateAssociation(_) => OperationKind::InsertOrUpdateAssociation,
            Operation::RemoveAssociation(_) => OperationKind::RemoveAssociation,
        }
    }

    /// Whether the handle holds a `V`.
    #[must_use]
    pub fn is<V: OperationVariant>(&self) -> bool {
        self.kind() == V::KIND
    }

    /// Borrows the held variant as `V`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::TypeMismatch`] naming `V`'s kind and the
    /// actual kind when the handle holds another variant. The handle is left
    /// untouched.
    pub fn narrow<V: OperationVariant>(&self) -> Result<&V, OperationError> {
        let narrowed = V::from_operation(self);
        debug_assert_eq!(
            narrowed.is_some(),
            self.kind() == V::KIND,
            "kind tag out of step with payload"
        );
        narrowed.ok_or(OperationError::TypeMismatch {
            requested: V::KIND,
            actual: self.kind(),
        })
    }

    /// Takes the held variant as `V`, or returns the handle unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Err(self)` when the handle holds another variant; use
    /// [`narrow`](Operation::narrow) for a diagnostic error instead.
    pub fn into_variant<V: OperationVariant>(self) -> Result<V, Self> {
        V::from_operation_owned(self)
    }

    /// Dispatches to the visitor method for the held kind.
    pub fn accept<V: OperationVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Operation::CreateByKey(op) => visitor.visit_create_by_key(op),
            Operation::InsertWithShape(op) => visitor.visit_insert_with_shape(op),
            Operation::InsertOrUpdateTuple(op) => visitor.visit_insert_or_update_tuple(op),
            Operation::RemoveTuple(op) => visitor.visit_remove_tuple(op),
            Operation::InsertOrUpdateAssociation(op) => {
                visitor.visit_insert_or_update_association(op)
            }
            Operation::RemoveAssociation(op) => visitor.visit_remove_association(op),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateByKey(op) => fmt::Display::fmt(op, f),
            Operation::InsertWithShape(op) => fmt::Display::fmt(op, f),
            Operation::InsertOrUpdateTuple(op) => fmt::Display::fmt(op, f),
            Operation::RemoveTuple(op) => fmt::Display::fmt(op, f),
            Operation::InsertOrUpdateAssociation(op) => fmt::Display::fmt(op, f),
            Operation::RemoveAssociation(op) => fmt::Display::fmt(op, f),
        }
    }
}

// ---------------------------------------------------------------------------
// Narrowing
// ---------------------------------------------------------------------------

mod sealed {
    pub trait Sealed {}
}

/// Implemented by every operation variant and nothing else.
pub trait OperationVariant: sealed::Sealed + fmt::Debug + fmt::Display + Sized {
    /// Kind tag of this variant type.
    const KIND: OperationKind;

    #[doc(hidden)]
    fn from_operation(op: &Operation) -> Option<&Self>;

    #[doc(hidden)]
    fn from_operation_owned(op: Operation) -> Result<Self, Operation>;
}

macro_rules! operation_variant {
    ($variant:ident) => {
        impl sealed::Sealed for $variant {}

        impl OperationVariant for $variant {
            const KIND: OperationKind = OperationKind::$variant;

            fn from_operation(op: &Operation) -> Option<&Self> {
                match op {
                    Operation::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_operation_owned(op: Operation) -> Result<Self, Operation> {
                match op {
                    Operation::$variant(inner) => Ok(inner),
                    other => Err(other),
                }
            }
        }

        impl From<$variant> for Operation {
            fn from(op: $variant) -> Self {
                Operation::$variant(op)
            }
        }
    };
}

operation_variant!(CreateByKey);
operation_variant!(InsertWithShape);
operation_variant!(InsertOrUpdateTuple);
operation_variant!(RemoveTuple);
operation_variant!(InsertOrUpdateAssociation);
operation_variant!(RemoveAssociation);

// ---------------------------------------------------------------------------
// Visitor
// ---------------------------------------------------------------------------

/// Exhaustive per-kind dispatch over an [`Operation`].
///
/// Every kind has a required method, so adding a kind breaks every visitor
/// at compile time instead of being skipped at run time.
pub trait OperationVisitor {
    type Output;

    fn visit_create_by_key(&mut self, op: &CreateByKey) -> Self::Output;

    fn visit_insert_with_shape(&mut self, op: &InsertWithShape) -> Self::Output;

    fn visit_insert_or_update_tuple(&mut self, op: &InsertOrUpdateTuple) -> Self::Output;

    fn visit_remove_tuple(&mut self, op: &RemoveTuple) -> Self::Output;

    fn visit_insert_or_update_association(
        &mut self,
        op: &InsertOrUpdateAssociation,
    ) -> Self::Output;

    fn visit_remove_association(&mut self, op: &RemoveAssociation) -> Self::Output;
}
