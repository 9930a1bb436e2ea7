use crate::{ColumnName, Namespace, TableName};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("table {table} defines column {column} more than once")]
    DuplicateColumn { table: TableName, column: ColumnName },

    #[error("{namespace}.{table} has no column issues, there is no migration to generate")]
    NoIssues {
        namespace: Namespace,
        table: TableName,
    },

    #[error("type spelling `{spelling}` belongs to both `{first}` and `{second}`")]
    ConflictingTypeFamily {
        spelling: String,
        first: String,
        second: String,
    },

    #[error("reading columns of {namespace}.{table}: {source}")]
    Catalog {
        namespace: Namespace,
        table: TableName,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
