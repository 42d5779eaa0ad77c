//! No-op [`GridDialect`] implementation.
//!
//! [`NullDialect`] accepts all writes and returns empty results for reads.
//! Useful for exercising the journaling path without a store behind it.

use async_trait::async_trait;
use tuplegrid_core::{AssociationKey, EntityKey, EntityKeyMetadata, Tuple};

use crate::dialect::GridDialect;

/// No-op `GridDialect` for testing and dry runs.
///
/// All write operations succeed immediately without side effects.
/// All read operations return `None`.
pub struct NullDialect;

#[async_trait]
impl GridDialect for NullDialect {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn get_tuple(&self, _key: &EntityKey) -> anyhow::Result<Option<Tuple>> {
        Ok(None)
    }

    async fn create_tuple(&self, _key: &EntityKey) -> anyhow::Result<()> {
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

    fn is_null(&self) -> bool {
        true
    }
}
