//! Table checks - compare a table definition against the columns a namespace
//! actually has.
//!
//! A [`TableCheck`] is built from pure data: the expected [`TableDef`], the
//! [`ActualColumn`]s a catalog reported, and a [`TypeEquivalence`]. It records
//! one [`Discrepancy`] per expected column that is missing or has the wrong
//! type, and turns them into a single `ALTER TABLE` statement:
//!
//! ```sql
//! ALTER TABLE feed_abc.stops ADD COLUMN stop_lat double precision, ALTER COLUMN stop_code TYPE text;
//! ```
//!
//! Columns the namespace has but the definition doesn't are ignored: older
//! namespaces may carry extra columns and are never penalized for them.
//! Nullability is not checked.

use crate::{ActualColumn, ColumnName, Error, Namespace, Result, TableDef, TypeEquivalence};
use std::fmt;

/// A difference between the expected and actual layout of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    /// The column does not exist.
    Missing {
        column: ColumnName,
        expected_type: String,
    },
    /// The column exists with a type that is not equivalent to the expected one.
    WrongType {
        column: ColumnName,
        expected_type: String,
        actual_type: String,
    },
}

impl Discrepancy {
    /// Name of the affected column.
    pub fn column(&self) -> &ColumnName {
        match self {
            Discrepancy::Missing { column, .. } | Discrepancy::WrongType { column, .. } => column,
        }
    }

    /// Type the table definition expects.
    pub fn expected_type(&self) -> &str {
        match self {
            Discrepancy::Missing { expected_type, .. }
            | Discrepancy::WrongType { expected_type, .. } => expected_type,
        }
    }

    /// Type the catalog reported, if the column exists.
    pub fn actual_type(&self) -> Option<&str> {
        match self {
            Discrepancy::Missing { .. } => None,
            Discrepancy::WrongType { actual_type, .. } => Some(actual_type),
        }
    }

    /// Generate the `ALTER TABLE` clause that fixes this discrepancy.
    pub fn to_sql(&self) -> String {
        match self {
            Discrepancy::Missing {
                column,
                expected_type,
            } => format!("ADD COLUMN {} {}", column, expected_type),
            Discrepancy::WrongType {
                column,
                expected_type,
                ..
            } => format!("ALTER COLUMN {} TYPE {}", column, expected_type),
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::Missing {
                column,
                expected_type,
            } => write!(f, "missing column: {} (expected: {})", column, expected_type),
            Discrepancy::WrongType {
                column,
                expected_type,
                actual_type,
            } => write!(
                f,
                "incorrect type for column: {} (expected: {}, actual: {})",
                column, expected_type, actual_type
            ),
        }
    }
}

/// The outcome of checking one table in one namespace.
#[derive(Debug, Clone)]
pub struct TableCheck<'a> {
    namespace: Namespace,
    table: &'a TableDef,
    missing_columns: Vec<Discrepancy>,
    columns_with_wrong_type: Vec<Discrepancy>,
}

impl<'a> TableCheck<'a> {
    /// Check `columns` (as reported for `table` in `namespace`) against the
    /// table definition.
    ///
    /// An empty `columns` list, e.g. because the table doesn't exist yet,
    /// reports every expected column as missing. If the catalog reports the
    /// same name twice, the first column wins.
    pub fn new(
        table: &'a TableDef,
        namespace: impl Into<Namespace>,
        columns: &[ActualColumn],
        types: &TypeEquivalence,
    ) -> Self {
        let namespace = namespace.into();
        let mut missing_columns = Vec::new();
        let mut columns_with_wrong_type = Vec::new();

        for expected in table.columns() {
            match columns.iter().find(|c| c.name == expected.name) {
                None => {
                    tracing::debug!(
                        namespace = %namespace,
                        table = %table.name(),
                        column = %expected.name,
                        expected_type = %expected.expected_type,
                        "column is missing"
                    );
                    missing_columns.push(Discrepancy::Missing {
                        column: expected.name.clone(),
                        expected_type: expected.expected_type.clone(),
                    });
                }
                Some(actual) if !types.is_equivalent(&actual.actual_type, &expected.expected_type) => {
                    tracing::debug!(
                        namespace = %namespace,
                        table = %table.name(),
                        column = %expected.name,
                        expected_type = %expected.expected_type,
                        actual_type = %actual.actual_type,
                        "column has the wrong type"
                    );
                    columns_with_wrong_type.push(Discrepancy::WrongType {
                        column: expected.name.clone(),
                        expected_type: expected.expected_type.clone(),
                        actual_type: actual.actual_type.clone(),
                    });
                }
                // Only identity columns are conventionally NOT NULL, and
                // nullability isn't checked for any column.
                Some(_) => {}
            }
        }

        Self {
            namespace,
            table,
            missing_columns,
            columns_with_wrong_type,
        }
    }

    /// Namespace the table was checked in.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The table definition that was checked.
    pub fn table(&self) -> &'a TableDef {
        self.table
    }

    /// Expected columns that don't exist, in definition order.
    pub fn missing_columns(&self) -> &[Discrepancy] {
        &self.missing_columns
    }

    /// Columns whose type doesn't match, in definition order.
    pub fn columns_with_wrong_type(&self) -> &[Discrepancy] {
        &self.columns_with_wrong_type
    }

    /// All discrepancies: missing columns first, then wrong types.
    pub fn discrepancies(&self) -> impl Iterator<Item = &Discrepancy> {
        self.missing_columns
            .iter()
            .chain(&self.columns_with_wrong_type)
    }

    /// Returns true if the table needs a migration.
    pub fn has_issues(&self) -> bool {
        !self.missing_columns.is_empty() || !self.columns_with_wrong_type.is_empty()
    }

    /// Build the statement that brings the table up to date.
    ///
    /// All columns are fixed in one `ALTER TABLE` so the change applies
    /// atomically: added columns first, then type changes. Fails with
    /// [`Error::NoIssues`] if there is nothing to fix.
    pub fn migration_statement(&self) -> Result<String> {
        if !self.has_issues() {
            return Err(Error::NoIssues {
                namespace: self.namespace.clone(),
                table: self.table.name().clone(),
            });
        }

        let clauses: Vec<String> = self.discrepancies().map(Discrepancy::to_sql).collect();

        Ok(format!(
            "ALTER TABLE {}.{} {};",
            self.namespace,
            self.table.name(),
            clauses.join(", ")
        ))
    }
}
