//! Error types for the persistence layer

use thiserror::Error;

/// Result type alias for store operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// A record with the same unique key already exists
    #[error("Duplicate transaction id: {transaction_id}")]
    Duplicate { transaction_id: String },

    /// Record not found
    #[error("Record not found: {id}")]
    NotFound { id: String },

    /// Serialization error while mapping stored data
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error (when the postgres feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Generic store error
    #[error("Store error: {0}")]
    Other(String),
}

impl RepositoryError {
    /// Returns true when the error is a duplicate-key rejection
    pub fn is_duplicate(&self) -> bool {
        matches!(self, RepositoryError::Duplicate { .. })
    }
}
