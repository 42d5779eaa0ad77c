//! Concrete operation shapes, one per [`OperationKind`](super::OperationKind).
//!
//! Every variant is a read-only description of an attempted store operation.
//! Constructors take every identifying field; fallible constructors reject
//! payloads that could not describe a real operation. Nothing here touches
//! a datastore.

use std::fmt;

use crate::error::OperationError;
use crate::key::{AssociationKey, EntityKey, EntityKeyMetadata};
use crate::tuple::Tuple;
use crate::types::write_joined;

/// Creation of a new, empty record under a known key.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateByKey {
    entity_key: EntityKey,
}

impl CreateByKey {
    #[must_use]
    pub fn new(entity_key: EntityKey) -> Self {
        Self { entity_key }
    }

    #[must_use]
    pub fn entity_key(&self) -> &EntityKey {
        &self.entity_key
    }

    #[must_use]
    pub fn into_entity_key(self) -> EntityKey {
        self.entity_key
    }
}

impl fmt::Display for CreateByKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CreateByKey [entity_key={}]", self.entity_key)
    }
}

/// Insertion of a full record whose key the datastore derives from the
/// payload and the key shape.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertWithShape {
    entity_key_metadata: EntityKeyMetadata,
    tuple: Tuple,
}

impl InsertWithShape {
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` if `tuple` is empty or lacks one
    /// of the key columns named by `entity_key_metadata`.
    pub fn new(entity_key_metadata: EntityKeyMetadata, tuple: Tuple) -> Result<Self, OperationError> {
        if tuple.is_empty() {
            return Err(OperationError::invalid(format!(
                "insert into {} has an empty payload",
                entity_key_metadata.table()
            )));
        }
        entity_key_metadata.key_from_tuple(&tuple)?;
        Ok(Self {
            entity_key_metadata,
            tuple,
        })
    }

    #[must_use]
    pub fn entity_key_metadata(&self) -> &EntityKeyMetadata {
        &self.entity_key_metadata
    }

    #[must_use]
    pub fn tuple(&self) -> &Tuple {
        &self.tuple
    }

    #[must_use]
    pub fn into_parts(self) -> (EntityKeyMetadata, Tuple) {
        (self.entity_key_metadata, self.tuple)
    }
}

impl fmt::Display for InsertWithShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InsertWithShape [entity_key_metadata={}, tuple={}]",
            self.entity_key_metadata, self.tuple
        )
    }
}

/// Write of columns to a record under a known key, creating it if absent.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOrUpdateTuple {
    entity_key: EntityKey,
    tuple: Tuple,
}

impl InsertOrUpdateTuple {
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` if `tuple` is empty.
    pub fn new(entity_key: EntityKey, tuple: Tuple) -> Result<Self, OperationError> {
        if tuple.is_empty() {
            return Err(OperationError::invalid(format!(
                "write to {entity_key} has an empty payload"
            )));
        }
        Ok(Self { entity_key, tuple })
    }

    #[must_use]
    pub fn entity_key(&self) -> &EntityKey {
        &self.entity_key
    }

    #[must_use]
    pub fn tuple(&self) -> &Tuple {
        &self.tuple
    }

    #[must_use]
    pub fn into_parts(self) -> (EntityKey, Tuple) {
        (self.entity_key, self.tuple)
    }
}

impl fmt::Display for InsertOrUpdateTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InsertOrUpdateTuple [entity_key={}, tuple={}]",
            self.entity_key, self.tuple
        )
    }
}

/// Removal of the record under a key.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveTuple {
    entity_key: EntityKey,
}

impl RemoveTuple {
    #[must_use]
    pub fn new(entity_key: EntityKey) -> Self {
        Self { entity_key }
    }

    #[must_use]
    pub fn entity_key(&self) -> &EntityKey {
        &self.entity_key
    }

    #[must_use]
    pub fn into_entity_key(self) -> EntityKey {
        self.entity_key
    }
}

impl fmt::Display for RemoveTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoveTuple [entity_key={}]", self.entity_key)
    }
}

/// Replacement of the rows of one association.
///
/// An empty row list is valid: it records an association emptied of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOrUpdateAssociation {
    association_key: AssociationKey,
    rows: Vec<Tuple>,
}

impl InsertOrUpdateAssociation {
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` if any row is empty.
    pub fn new(association_key: AssociationKey, rows: Vec<Tuple>) -> Result<Self, OperationError> {
        if let Some(position) = rows.iter().position(Tuple::is_empty) {
            return Err(OperationError::invalid(format!(
                "row {position} of {association_key} is empty"
            )));
        }
        Ok(Self {
            association_key,
            rows,
        })
    }

    #[must_use]
    pub fn association_key(&self) -> &AssociationKey {
        &self.association_key
    }

    #[must_use]
    pub fn rows(&self) -> &[Tuple] {
        &self.rows
    }

    #[must_use]
    pub fn into_parts(self) -> (AssociationKey, Vec<Tuple>) {
        (self.association_key, self.rows)
    }
}

impl fmt::Display for InsertOrUpdateAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InsertOrUpdateAssociation [association_key={}, rows=[", self.association_key)?;
        write_joined(f, &self.rows)?;
        f.write_str("]]")
    }
}

/// Removal of a whole association.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveAssociation {
    association_key: AssociationKey,
}

impl RemoveAssociation {
    #[must_use]
    pub fn new(association_key: AssociationKey) -> Self {
        Self { association_key }
    }

    #[must_use]
    pub fn association_key(&self) -> &AssociationKey {
        &self.association_key
    }

    #[must_use]
    pub fn into_association_key(self) -> AssociationKey {
        self.association_key
    }
}

impl fmt::Display for RemoveAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoveAssociation [association_key={}]", self.association_key)
    }
}
