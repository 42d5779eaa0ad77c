//! `GridDialect` implementations.
//!
//! Provides concrete backends for the [`GridDialect`](crate::dialect::GridDialect) trait:
//! [`HashMapDialect`], an in-memory store and the default backend, and
//! [`NullDialect`], which discards everything.

mod hashmap;
mod null;

pub use hashmap::HashMapDialect;
pub use null::NullDialect;
