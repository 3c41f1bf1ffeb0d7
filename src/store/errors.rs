//! Store error types

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by a store implementation
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// The secondary index does not exist on the table
    #[error("Index {index} not found on table {table}")]
    IndexNotFound { table: String, index: String },

    /// The request was rejected as malformed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The on-disk snapshot could not be written
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl StoreError {
    /// Whether the error describes the shape of the request or schema
    /// rather than a failure of the store itself
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::IndexNotFound { .. } | Self::Validation(_))
    }
}
