//! Runtime error types

use fraudwatch_core::{AlertStatus, CoreError};
use fraudwatch_repository::RepositoryError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Input failed validation
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// The transaction id already exists (synchronous-path conflict)
    #[error("Duplicate transaction id: {transaction_id}")]
    Duplicate { transaction_id: String },

    /// Alert not found
    #[error("Alert not found: {id}")]
    AlertNotFound { id: String },

    /// The requested alert transition is not allowed from the current state
    #[error("Cannot {action} alert in state {from:?}")]
    InvalidTransition {
        action: &'static str,
        from: AlertStatus,
    },

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(RepositoryError),
}

impl From<RepositoryError> for RuntimeError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate { transaction_id } => {
                RuntimeError::Duplicate { transaction_id }
            }
            RepositoryError::NotFound { id } => RuntimeError::AlertNotFound { id },
            other => RuntimeError::Store(other),
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
