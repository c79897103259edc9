//! Error types for Fraudwatch Core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl CoreError {
    /// Shorthand for a field validation failure
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
