//! `tuplegrid` Store: datastore dialects, units of work, and journal failure
//! handling on top of `tuplegrid-core` operations.

pub mod config;
pub mod dialect;
pub mod dialects;
pub mod factory;
pub mod failure;
pub mod logging;
pub mod unit_of_work;

pub use config::{ConfigError, DatastoreKind, LogFormat, LoggingConfig, StoreConfig};
pub use dialect::{apply, GridDialect};
pub use dialects::{HashMapDialect, NullDialect};
pub use factory::DialectFactory;
pub use failure::{
    handle_failure, EntryOutcome, FailureHandler, FailureHandlingError, FailureReport,
    LoggingFailureHandler,
};
pub use logging::{init_logging, LoggingError};
pub use unit_of_work::{PartialFailure, RecordedFailure, UnitOfWork, UnitOfWorkError};
