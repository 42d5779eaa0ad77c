//! Store configuration.
//!
//! [`StoreConfig`] is an explicit value: it is built once (by default, from
//! the environment, or from any key lookup) and passed to whatever selects
//! a dialect or installs logging. Nothing reads it from global state.

use std::fmt;
use std::str::FromStr;

/// Environment variable naming the datastore backend.
pub const DATASTORE_ENV: &str = "TUPLEGRID_DATASTORE";
/// Environment variable holding the log filter directive.
pub const LOG_FILTER_ENV: &str = "TUPLEGRID_LOG";
/// Environment variable selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "TUPLEGRID_LOG_FORMAT";

/// Errors from reading configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown datastore {value:?}, expected one of: hashmap, null")]
    UnknownDatastore { value: String },
    #[error("unknown log format {value:?}, expected one of: pretty, json")]
    UnknownLogFormat { value: String },
}

/// Backend a [`DialectFactory`](crate::factory::DialectFactory) builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatastoreKind {
    /// In-memory store.
    #[default]
    HashMap,
    /// Store that discards every write.
    Null,
}

impl DatastoreKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DatastoreKind::HashMap => "hashmap",
            DatastoreKind::Null => "null",
        }
    }
}

impl fmt::Display for DatastoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatastoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashmap" | "hash_map" | "memory" => Ok(DatastoreKind::HashMap),
            "null" | "none" => Ok(DatastoreKind::Null),
            _ => Err(ConfigError::UnknownDatastore {
                value: s.to_string(),
            }),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::UnknownLogFormat {
                value: s.to_string(),
            }),
        }
    }
}

/// Logging settings consumed by [`init_logging`](crate::logging::init_logging).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"tuplegrid_store=debug"`.
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Top-level configuration for the store layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backend used for new units of work.
    pub datastore: DatastoreKind,
    pub logging: LoggingConfig,
}

impl StoreConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unrecognised datastore or log format.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for an unrecognised datastore or log format.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(value) = lookup(DATASTORE_ENV) {
            config.datastore = value.parse()?;
        }
        if let Some(value) = lookup(LOG_FILTER_ENV) {
            if !value.trim().is_empty() {
                config.logging.filter = value;
            }
        }
        if let Some(value) = lookup(LOG_FORMAT_ENV) {
            config.logging.format = value.parse()?;
        }
        Ok(config)
    }
}
