//! Errors raised by the operation model.
//!
//! All three conditions are programming defects rather than responses to
//! legitimate input. They are propagated to the caller and never retried.

use crate::operation::OperationKind;

/// Errors from building, narrowing or dispatching operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// A handle was narrowed to a variant type that does not match its kind.
    #[error("cannot narrow operation of kind {actual} to {requested}")]
    TypeMismatch {
        requested: OperationKind,
        actual: OperationKind,
    },
    /// A consumer met a kind it does not handle.
    #[error("unhandled operation kind: {kind}")]
    UnknownKind { kind: OperationKind },
    /// A key or variant was built with missing or invalid fields.
    #[error("invalid operation arguments: {reason}")]
    InvalidOperationArguments { reason: String },
}

impl OperationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        OperationError::InvalidOperationArguments {
            reason: reason.into(),
        }
    }
}
