//! Reading actual columns, and checking whole namespaces.
//!
//! drift never talks to a database itself. Whatever knows how to list the
//! columns of a table in a namespace implements [`CatalogReader`];
//! [`check_namespace`] then checks each expected table against what the reader
//! returns.
//!
//! ```ignore
//! let check = drift::check_namespace(&reader, &"feed_abc".into(), &tables, &types).await?;
//! for sql in check.migration_statements()? {
//!     executor.run(&sql).await?;
//! }
//! ```

use crate::{
    ActualColumn, Error, Namespace, ReportSink, Result, TableCheck, TableDef, TableName,
    TypeEquivalence,
};
use indexmap::IndexMap;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use tracing::Instrument;

/// Lists the columns a table actually has in a namespace.
pub trait CatalogReader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns every column of `table` in `namespace`, with the type name the
    /// database reports. Returns an empty list if the table doesn't exist.
    fn resolve_columns(
        &self,
        namespace: &Namespace,
        table: &TableDef,
    ) -> impl Future<Output = std::result::Result<Vec<ActualColumn>, Self::Error>> + Send;
}

/// A catalog snapshot held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: IndexMap<(Namespace, TableName), Vec<ActualColumn>>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the columns of a table, replacing any previous entry.
    pub fn insert(
        &mut self,
        namespace: impl Into<Namespace>,
        table: impl Into<TableName>,
        columns: impl IntoIterator<Item = ActualColumn>,
    ) {
        self.tables.insert(
            (namespace.into(), table.into()),
            columns.into_iter().collect(),
        );
    }

    /// Builder form of [`StaticCatalog::insert`].
    pub fn with_table(
        mut self,
        namespace: impl Into<Namespace>,
        table: impl Into<TableName>,
        columns: impl IntoIterator<Item = ActualColumn>,
    ) -> Self {
        self.insert(namespace, table, columns);
        self
    }

    /// Columns recorded for a table; empty if the table is unknown.
    pub fn columns(&self, namespace: &Namespace, table: &TableName) -> &[ActualColumn] {
        self.tables
            .get(&(namespace.clone(), table.clone()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl CatalogReader for StaticCatalog {
    type Error = Infallible;

    async fn resolve_columns(
        &self,
        namespace: &Namespace,
        table: &TableDef,
    ) -> std::result::Result<Vec<ActualColumn>, Infallible> {
        Ok(self.columns(namespace, table.name()).to_vec())
    }
}

/// The outcome of checking every expected table of one namespace.
#[derive(Debug, Clone)]
pub struct NamespaceCheck<'a> {
    namespace: Namespace,
    tables: Vec<TableCheck<'a>>,
}

impl<'a> NamespaceCheck<'a> {
    /// Namespace that was checked.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// One check per table definition, in definition order.
    pub fn tables(&self) -> &[TableCheck<'a>] {
        &self.tables
    }

    /// Checks of the tables that need a migration.
    pub fn tables_with_issues(&self) -> impl Iterator<Item = &TableCheck<'a>> {
        self.tables.iter().filter(|t| t.has_issues())
    }

    /// Returns true if any table needs a migration.
    pub fn has_issues(&self) -> bool {
        self.tables.iter().any(TableCheck::has_issues)
    }

    /// One `ALTER TABLE` statement per table that needs a migration.
    pub fn migration_statements(&self) -> Result<Vec<String>> {
        self.tables_with_issues()
            .map(TableCheck::migration_statement)
            .collect()
    }

    /// Send the report of every table with issues to `sink`.
    pub fn report_to(&self, sink: &impl ReportSink) {
        for table in &self.tables {
            table.report_to(sink);
        }
    }
}

impl fmt::Display for NamespaceCheck<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let with_issues = self.tables_with_issues().count();
        if with_issues == 0 {
            return writeln!(f, "No issues in namespace {}.", self.namespace);
        }

        writeln!(
            f,
            "Issues in namespace {}: {} of {} tables need migration",
            self.namespace,
            with_issues,
            self.tables.len()
        )?;
        for table in self.tables_with_issues() {
            write!(f, "{}", table)?;
        }
        Ok(())
    }
}

/// Check every table of `tables` in `namespace`.
///
/// The reader is queried once per table, in order. A reader failure aborts
/// the check and is returned as [`Error::Catalog`].
pub async fn check_namespace<'a, R: CatalogReader>(
    reader: &R,
    namespace: &Namespace,
    tables: &'a [TableDef],
    types: &TypeEquivalence,
) -> Result<NamespaceCheck<'a>> {
    let span = tracing::debug_span!(
        "drift.check_namespace",
        namespace = %namespace,
        tables = tables.len(),
        with_issues = tracing::field::Empty,
    );

    let mut checks = Vec::with_capacity(tables.len());
    for table in tables {
        let columns = reader
            .resolve_columns(namespace, table)
            .instrument(span.clone())
            .await
            .map_err(|e| Error::Catalog {
                namespace: namespace.clone(),
                table: table.name().clone(),
                source: Box::new(e),
            })?;

        let check = span.in_scope(|| TableCheck::new(table, namespace.clone(), &columns, types));
        if check.has_issues() {
            tracing::debug!(
                parent: &span,
                table = %table.name(),
                missing = check.missing_columns().len(),
                wrong_type = check.columns_with_wrong_type().len(),
                "table needs migration"
            );
        }
        checks.push(check);
    }

    let check = NamespaceCheck {
        namespace: namespace.clone(),
        tables: checks,
    };
    let with_issues = check.tables_with_issues().count();
    span.record("with_issues", with_issues);
    tracing::info!(
        parent: &span,
        namespace = %namespace,
        with_issues,
        "checked namespace"
    );

    Ok(check)
}
