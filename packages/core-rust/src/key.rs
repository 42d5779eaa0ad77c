//! Keys identifying entities and associations in a datastore.
//!
//! A key *shape* ([`EntityKeyMetadata`], [`AssociationKeyMetadata`]) names a
//! table and its ordered key columns independent of any value. A key
//! ([`EntityKey`], [`AssociationKey`]) pairs a shape with one value per
//! column. All key types validate on construction and are immutable.

use std::collections::HashSet;
use std::fmt;

use crate::error::OperationError;
use crate::tuple::Tuple;
use crate::types::{write_joined, Value};

/// Validated table name plus ordered, distinct column names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct KeyShape {
    table: String,
    column_names: Vec<String>,
}

impl KeyShape {
    fn new(table: String, column_names: Vec<String>) -> Result<Self, OperationError> {
        if table.trim().is_empty() {
            return Err(OperationError::invalid("table name must not be empty"));
        }
        if column_names.is_empty() {
            return Err(OperationError::invalid(format!(
                "key of table {table} must have at least one column"
            )));
        }
        let mut seen = HashSet::with_capacity(column_names.len());
        for column in &column_names {
            if column.trim().is_empty() {
                return Err(OperationError::invalid(format!(
                    "key of table {table} has an empty column name"
                )));
            }
            if !seen.insert(column.as_str()) {
                return Err(OperationError::invalid(format!(
                    "key of table {table} repeats column {column}"
                )));
            }
        }
        Ok(Self {
            table,
            column_names,
        })
    }

    fn check_values(&self, values: &[Value]) -> Result<(), OperationError> {
        if values.len() == self.column_names.len() {
            Ok(())
        } else {
            Err(OperationError::invalid(format!(
                "key of table {} expects {} value(s) for columns [{}], got {}",
                self.table,
                self.column_names.len(),
                self.column_names.join(", "),
                values.len()
            )))
        }
    }

    fn fmt_fields(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table={}, columns=[", self.table)?;
        write_joined(f, &self.column_names)?;
        f.write_str("]")
    }
}

fn into_names<I, S>(column_names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    column_names.into_iter().map(Into::into).collect()
}

// ---------------------------------------------------------------------------
// Entity keys
// ---------------------------------------------------------------------------

/// Shape of an entity key: target table and key-column layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKeyMetadata {
    shape: KeyShape,
}

impl EntityKeyMetadata {
    /// Builds a key shape.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` if the table name is empty, there
    /// are no key columns, or a column name is empty or repeated.
    pub fn new<I, S>(table: impl Into<String>, column_names: I) -> Result<Self, OperationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            shape: KeyShape::new(table.into(), into_names(column_names))?,
        })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.shape.table
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.shape.column_names
    }

    /// Whether `column` is part of this key.
    #[must_use]
    pub fn is_key_column(&self, column: &str) -> bool {
        self.shape.column_names.iter().any(|c| c == column)
    }

    /// Derives the key of the record held in `tuple`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` naming the first key column the
    /// tuple does not contain.
    pub fn key_from_tuple(&self, tuple: &Tuple) -> Result<EntityKey, OperationError> {
        let mut values = Vec::with_capacity(self.shape.column_names.len());
        for column in &self.shape.column_names {
            let value = tuple.get(column).ok_or_else(|| {
                OperationError::invalid(format!(
                    "tuple for table {} lacks key column {column}",
                    self.shape.table
                ))
            })?;
            values.push(value.clone());
        }
        Ok(EntityKey {
            metadata: self.clone(),
            column_values: values,
        })
    }
}

impl fmt::Display for EntityKeyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EntityKeyMetadata [")?;
        self.shape.fmt_fields(f)?;
        f.write_str("]")
    }
}

/// Key of a single entity: a shape plus one value per key column.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityKey {
    metadata: EntityKeyMetadata,
    column_values: Vec<Value>,
}

impl EntityKey {
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` if the number of values differs
    /// from the number of key columns.
    pub fn new(
        metadata: EntityKeyMetadata,
        column_values: Vec<Value>,
    ) -> Result<Self, OperationError> {
        metadata.shape.check_values(&column_values)?;
        Ok(Self {
            metadata,
            column_values,
        })
    }

    /// Key over a single column, e.g. `EntityKey::single("Order", "id", 42)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` for an empty table or column name.
    pub fn single(
        table: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, OperationError> {
        let column: String = column.into();
        let metadata = EntityKeyMetadata::new(table, [column])?;
        Self::new(metadata, vec![value.into()])
    }

    #[must_use]
    pub fn metadata(&self) -> &EntityKeyMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.metadata.table()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.metadata.column_names()
    }

    #[must_use]
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }

    /// Value of key column `column`, if it belongs to the key.
    #[must_use]
    pub fn value_of(&self, column: &str) -> Option<&Value> {
        self.column_names()
            .iter()
            .position(|c| c == column)
            .map(|i| &self.column_values[i])
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EntityKey [")?;
        self.metadata.shape.fmt_fields(f)?;
        f.write_str(", values=[")?;
        write_joined(f, &self.column_values)?;
        f.write_str("]]")
    }
}

// ---------------------------------------------------------------------------
// Association keys
// ---------------------------------------------------------------------------

/// Shape of an association key: association table and owner-side columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssociationKeyMetadata {
    shape: KeyShape,
}

impl AssociationKeyMetadata {
    /// # Errors
    ///
    /// Same rules as [`EntityKeyMetadata::new`].
    pub fn new<I, S>(table: impl Into<String>, column_names: I) -> Result<Self, OperationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            shape: KeyShape::new(table.into(), into_names(column_names))?,
        })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.shape.table
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.shape.column_names
    }
}

impl fmt::Display for AssociationKeyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AssociationKeyMetadata [")?;
        self.shape.fmt_fields(f)?;
        f.write_str("]")
    }
}

/// Key of one association instance, e.g. the order lines of order 42.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationKey {
    metadata: AssociationKeyMetadata,
    column_values: Vec<Value>,
}

impl AssociationKey {
    /// # Errors
    ///
    /// Returns `InvalidOperationArguments` if the number of values differs
    /// from the number of key columns.
    pub fn new(
        metadata: AssociationKeyMetadata,
        column_values: Vec<Value>,
    ) -> Result<Self, OperationError> {
        metadata.shape.check_values(&column_values)?;
        Ok(Self {
            metadata,
            column_values,
        })
    }

    #[must_use]
    pub fn metadata(&self) -> &AssociationKeyMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn table(&self) -> &str {
        self.metadata.table()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        self.metadata.column_names()
    }

    #[must_use]
    pub fn column_values(&self) -> &[Value] {
        &self.column_values
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AssociationKey [")?;
        self.metadata.shape.fmt_fields(f)?;
        f.write_str(", values=[")?;
        write_joined(f, &self.column_values)?;
        f.write_str("]]")
    }
}
