//! In-memory [`GridDialect`] implementation backed by [`DashMap`].
//!
//! Records and association rows are stored `MsgPack`-encoded, keyed by the
//! textual form of their key, so a stored tuple never aliases a caller's
//! value. Like most non-relational stores it offers no multi-call atomicity.

use anyhow::bail;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tuplegrid_core::{AssociationKey, EntityKey, EntityKeyMetadata, Tuple};

use crate::dialect::GridDialect;

/// In-memory store, the default backend.
pub struct HashMapDialect {
    entities: DashMap<String, Vec<u8>>,
    associations: DashMap<String, Vec<u8>>,
}

impl HashMapDialect {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
            associations: DashMap::new(),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of stored associations.
    #[must_use]
    pub fn association_count(&self) -> usize {
        self.associations.len()
    }

    /// Drops every record and association.
    pub fn clear(&self) {
        self.entities.clear();
        self.associations.clear();
    }

    /// Stores a new record, failing if `key` is taken.
    fn insert_new(&self, key: &EntityKey, tuple: &Tuple) -> anyhow::Result<()> {
        match self.entities.entry(key.to_string()) {
            Entry::Occupied(_) => bail!("entity {key} already exists"),
            Entry::Vacant(slot) => {
                slot.insert(rmp_serde::to_vec(tuple)?);
                Ok(())
            }
        }
    }
}

impl Default for HashMapDialect {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GridDialect for HashMapDialect {
    fn name(&self) -> &'static str {
        "hashmap"
    }

    async fn get_tuple(&self, key: &EntityKey) -> anyhow::Result<Option<Tuple>> {
        match self.entities.get(&key.to_string()) {
            Some(bytes) => Ok(Some(rmp_serde::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    async fn create_tuple(&self, key: &EntityKey) -> anyhow::Result<()> {
        self.insert_new(key, &Tuple::new())
    }

    async fn insert_tuple(
        &self,
        metadata: &EntityKeyMetadata,
        tuple: &Tuple,
    ) -> anyhow::Result<EntityKey> {
        let key = metadata.key_from_tuple(tuple)?;
        self.insert_new(&key, tuple)?;
        Ok(key)
    }

    async fn insert_or_update_tuple(&self, key: &EntityKey, tuple: &Tuple) -> anyhow::Result<()> {
        match self.entities.entry(key.to_string()) {
            Entry::Occupied(mut stored) => {
                let mut current: Tuple = rmp_serde::from_slice(stored.get())?;
                current.merge(tuple);
                stored.insert(rmp_serde::to_vec(&current)?);
            }
            Entry::Vacant(slot) => {
                slot.insert(rmp_serde::to_vec(tuple)?);
            }
        }
        Ok(())
    }

    async fn remove_tuple(&self, key: &EntityKey) -> anyhow::Result<()> {
        self.entities.remove(&key.to_string());
        Ok(())
    }

    async fn get_association(&self, key: &AssociationKey) -> anyhow::Result<Option<Vec<Tuple>>> {
        match self.associations.get(&key.to_string()) {
            Some(bytes) => Ok(Some(rmp_serde::from_slice(bytes.value())?)),
            None => Ok(None),
        }
    }

    async fn insert_or_update_association(
        &self,
        key: &AssociationKey,
        rows: &[Tuple],
    ) -> anyhow::Result<()> {
        self.associations
            .insert(key.to_string(), rmp_serde::to_vec(rows)?);
        Ok(())
    }

    async fn remove_association(&self, key: &AssociationKey) -> anyhow::Result<()> {
        self.associations.remove(&key.to_string());
        Ok(())
    }
}
