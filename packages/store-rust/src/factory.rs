//! Factory for creating [`GridDialect`] instances.
//!
//! [`DialectFactory`] is the dependency injection point for backends: the
//! caller picks a [`DatastoreKind`] (usually from
//! [`StoreConfig`](crate::config::StoreConfig)) and hands the resulting
//! dialect to whatever runs units of work.

use std::sync::Arc;

use tracing::debug;

use crate::config::{DatastoreKind, StoreConfig};
use crate::dialect::GridDialect;
use crate::dialects::{HashMapDialect, NullDialect};

/// Builds dialects for a configured backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialectFactory {
    datastore: DatastoreKind,
}

impl DialectFactory {
    #[must_use]
    pub fn new(datastore: DatastoreKind) -> Self {
        Self { datastore }
    }

    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.datastore)
    }

    #[must_use]
    pub fn datastore(&self) -> DatastoreKind {
        self.datastore
    }

    /// Creates a fresh dialect of the configured kind.
    ///
    /// Every call returns an independent store.
    #[must_use]
    pub fn create(&self) -> Arc<dyn GridDialect> {
        let dialect: Arc<dyn GridDialect> = match self.datastore {
            DatastoreKind::HashMap => Arc::new(HashMapDialect::new()),
            DatastoreKind::Null => Arc::new(NullDialect),
        };
        debug!(dialect = dialect.name(), "using grid dialect");
        dialect
    }
}

#[cfg(test)]
mod tests {
    use tuplegrid_core::EntityKey;

    use super::*;

    #[test]
    fn default_factory_builds_hashmap_dialect() {
        let factory = DialectFactory::default();
        assert_eq!(factory.datastore(), DatastoreKind::HashMap);
        let dialect = factory.create();
        assert_eq!(dialect.name(), "hashmap");
        assert!(!dialect.is_null());
    }

    #[test]
    fn factory_follows_config() {
        let config = StoreConfig {
            datastore: DatastoreKind::Null,
            ..StoreConfig::default()
        };
        let dialect = DialectFactory::from_config(&config).create();
        assert_eq!(dialect.name(), "null");
        assert!(dialect.is_null());
    }

    #[tokio::test]
    async fn factory_creates_independent_stores() {
        let factory = DialectFactory::new(DatastoreKind::HashMap);
        let a = factory.create();
        let b = factory.create();
        let key = EntityKey::single("Order", "id", 1_i64).unwrap();

        a.create_tuple(&key).await.unwrap();

        assert!(a.get_tuple(&key).await.unwrap().is_some());
        assert!(b.get_tuple(&key).await.unwrap().is_none(), "stores should be independent");
    }
}
