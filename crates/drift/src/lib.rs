//! Schema reconciliation for per-feed Postgres namespaces.
//!
//! Every imported feed version lives in its own namespace, created with
//! whatever table definitions were current at import time. When a definition
//! gains a column or changes a column's type, older namespaces drift. This
//! crate finds that drift and produces the SQL that fixes it, without ever
//! touching a database:
//!
//! 1. A [`CatalogReader`] lists the columns a table really has.
//! 2. [`TableCheck::new`] compares them with the [`TableDef`], using a
//!    [`TypeEquivalence`] so `character varying` matches `text`.
//! 3. [`TableCheck::migration_statement`] returns one `ALTER TABLE` statement
//!    that adds missing columns and fixes column types.
//!
//! ```
//! use drift::{ActualColumn, ColumnDescriptor, TableCheck, TableDef, TypeEquivalence};
//!
//! let stops = TableDef::new(
//!     "stops",
//!     [
//!         ColumnDescriptor::new("stop_id", "text"),
//!         ColumnDescriptor::new("stop_lat", "double precision"),
//!     ],
//! )?;
//! let columns = [ActualColumn::new("stop_id", "character varying")];
//!
//! let check = TableCheck::new(&stops, "feed_abc", &columns, &TypeEquivalence::postgres());
//! assert!(check.has_issues());
//! assert_eq!(
//!     check.migration_statement()?,
//!     "ALTER TABLE feed_abc.stops ADD COLUMN stop_lat double precision;"
//! );
//! # Ok::<(), drift::Error>(())
//! ```
//!
//! Columns that exist in a namespace but not in the definition are left alone,
//! and nullability is not compared.

mod catalog;
mod check;
pub mod equivalence;
mod error;
mod report;
mod schema;

pub use catalog::{CatalogReader, NamespaceCheck, StaticCatalog, check_namespace};
pub use check::{Discrepancy, TableCheck};
pub use equivalence::TypeEquivalence;
pub use error::Error;
pub use report::{ReportSink, TracingSink, render_report};
pub use schema::{ActualColumn, ColumnDescriptor, ColumnName, Namespace, TableDef, TableName};

// Re-export the config types used to build a `TypeEquivalence`
pub use drift_config::{Config, TypeFamily};

/// Result type for drift operations.
pub type Result<T> = std::result::Result<T, Error>;
