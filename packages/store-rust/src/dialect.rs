//! Datastore adapter trait.
//!
//! Defines [`GridDialect`], the boundary between journaled operations and a
//! concrete store, and [`apply`], which executes one [`Operation`] against a
//! dialect.

use async_trait::async_trait;
use tuplegrid_core::{
    AssociationKey, EntityKey, EntityKeyMetadata, Operation, OperationError, Tuple,
};

/// Adapter executing tuple and association operations against one datastore.
///
/// Implementations decide how data is laid out and whether anything spans
/// more than one call; most non-relational stores do not.
///
/// Used as `Arc<dyn GridDialect>`.
#[async_trait]
pub trait GridDialect: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Load the tuple stored under `key`, or `None` if there is none.
    async fn get_tuple(&self, key: &EntityKey) -> anyhow::Result<Option<Tuple>>;

    /// Create an empty record under `key`.
    async fn create_tuple(&self, key: &EntityKey) -> anyhow::Result<()>;

    /// Insert a full record and return the key derived from its payload.
    async fn insert_tuple(
        &self,
        metadata: &EntityKeyMetadata,
        tuple: &Tuple,
    ) -> anyhow::Result<EntityKey>;

    /// Write the columns of `tuple` under `key`, creating the record if absent.
    async fn insert_or_update_tuple(&self, key: &EntityKey, tuple: &Tuple) -> anyhow::Result<()>;

    /// Remove the record under `key`. Removing an absent record is not an error.
    async fn remove_tuple(&self, key: &EntityKey) -> anyhow::Result<()>;

    /// Load the rows of an association, or `None` if there is none.
    async fn get_association(&self, key: &AssociationKey) -> anyhow::Result<Option<Vec<Tuple>>>;

    /// Replace the rows of an association.
    async fn insert_or_update_association(
        &self,
        key: &AssociationKey,
        rows: &[Tuple],
    ) -> anyhow::Result<()>;

    /// Remove an association. Removing an absent association is not an error.
    async fn remove_association(&self, key: &AssociationKey) -> anyhow::Result<()>;

    /// Whether the store can group several calls atomically.
    ///
    /// Returns `false` by default.
    fn supports_transactions(&self) -> bool {
        false
    }

    /// Whether this is a null (no-op) implementation.
    ///
    /// Returns `false` by default. Null implementations override to return `true`.
    fn is_null(&self) -> bool {
        false
    }
}

/// Executes `op` against `dialect`.
///
/// # Errors
///
/// Returns the dialect's error, or [`OperationError::UnknownKind`] for a kind
/// this crate does not know how to execute.
pub async fn apply(dialect: &dyn GridDialect, op: &Operation) -> anyhow::Result<()> {
    match op {
        Operation::CreateByKey(op) => dialect.create_tuple(op.entity_key()).await,
        Operation::InsertWithShape(op) => dialect
            .insert_tuple(op.entity_key_metadata(), op.tuple())
            .await
            .map(|_| ()),
        Operation::InsertOrUpdateTuple(op) => {
            dialect
                .insert_or_update_tuple(op.entity_key(), op.tuple())
                .await
        }
        Operation::RemoveTuple(op) => dialect.remove_tuple(op.entity_key()).await,
        Operation::InsertOrUpdateAssociation(op) => {
            dialect
                .insert_or_update_association(op.association_key(), op.rows())
                .await
        }
        Operation::RemoveAssociation(op) => dialect.remove_association(op.association_key()).await,
        other => Err(OperationError::UnknownKind { kind: other.kind() }.into()),
    }
}
