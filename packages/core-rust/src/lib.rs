//! `tuplegrid` Core: values, tuples, keys, typed store operations, and the
//! operation journal.

pub mod error;
pub mod journal;
pub mod key;
pub mod operation;
pub mod tuple;
pub mod types;

pub use error::OperationError;
pub use journal::{FrozenJournal, OperationJournal};
pub use key::{AssociationKey, AssociationKeyMetadata, EntityKey, EntityKeyMetadata};
pub use operation::{
    CreateByKey, InsertOrUpdateAssociation, InsertOrUpdateTuple, InsertWithShape, Operation,
    OperationKind, OperationVariant, OperationVisitor, RemoveAssociation, RemoveTuple,
};
pub use tuple::Tuple;
pub use types::Value;
