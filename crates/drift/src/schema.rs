//! Expected and actual column layouts.
//!
//! A [`TableDef`] is what the application expects a table to look like. An
//! [`ActualColumn`] is what a catalog reports a namespace really contains.

use crate::{Error, Result};
use std::collections::HashSet;
use strid::braid;

/// The name of a namespace (a Postgres schema holding one feed version).
#[braid]
pub struct Namespace;

/// The name of a table, without its namespace.
#[braid]
pub struct TableName;

/// The name of a column.
#[braid]
pub struct ColumnName;

/// One column a table definition expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: ColumnName,
    /// Canonical type, rendered verbatim into migration statements
    pub expected_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<ColumnName>, expected_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expected_type: expected_type.into(),
        }
    }
}

/// A column as reported by the catalog of a namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualColumn {
    /// Column name
    pub name: ColumnName,
    /// Raw type name, e.g. `character varying` or `varchar(255)`
    pub actual_type: String,
}

impl ActualColumn {
    pub fn new(name: impl Into<ColumnName>, actual_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actual_type: actual_type.into(),
        }
    }
}

/// The current definition of a table: its name and ordered expected columns.
///
/// Column names are unique; [`TableDef::new`] rejects duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    name: TableName,
    columns: Vec<ColumnDescriptor>,
}

impl TableDef {
    /// Create a table definition, failing if a column name appears twice.
    pub fn new(
        name: impl Into<TableName>,
        columns: impl IntoIterator<Item = ColumnDescriptor>,
    ) -> Result<Self> {
        let name = name.into();
        let columns: Vec<ColumnDescriptor> = columns.into_iter().collect();

        let mut seen: HashSet<&str> = HashSet::with_capacity(columns.len());
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::DuplicateColumn {
                    table: name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        Ok(Self { name, columns })
    }

    /// Table name.
    pub fn name(&self) -> &TableName {
        &self.name
    }

    /// Expected columns, in definition order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Get an expected column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name.as_str() == name)
    }
}
