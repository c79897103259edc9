//! Server error types
//!
//! Maps the error taxonomy onto HTTP statuses: validation 400, conflicts
//! (duplicate ids, invalid alert transitions) 409, unknown ids 404, rate
//! limiting 429, everything unexpected 500. Alert-generation, fan-out and
//! cache failures never reach this type; they are logged at their call
//! sites and the write path proceeds.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fraudwatch_repository::RepositoryError;
use fraudwatch_runtime::RuntimeError;
use serde_json::json;
use std::fmt;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or out-of-range input
    Validation(String),

    /// Duplicate unique field or illegal state transition
    Conflict(String),

    /// Unknown transaction or alert id
    NotFound(String),

    /// Request quota exceeded
    RateLimited(String),

    /// Unexpected failure
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::RateLimited(msg) => write!(f, "Rate limited: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Validation(e) => ApiError::Validation(e.to_string()),
            RuntimeError::Duplicate { transaction_id } => {
                ApiError::Conflict(format!("Transaction ID already exists: {}", transaction_id))
            }
            RuntimeError::AlertNotFound { id } => ApiError::NotFound(format!("Alert: {}", id)),
            RuntimeError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            RuntimeError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate { transaction_id } => {
                ApiError::Conflict(format!("Transaction ID already exists: {}", transaction_id))
            }
            RepositoryError::NotFound { id } => ApiError::NotFound(id),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudwatch_core::{AlertStatus, CoreError};

    #[test]
    fn test_display() {
        let err = ApiError::Conflict("Transaction ID already exists: TXN1".to_string());
        assert_eq!(
            err.to_string(),
            "Conflict: Transaction ID already exists: TXN1"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound("gone".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::RateLimited("slow down".into())
                .into_response()
                .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_runtime_error_conversion() {
        let err: ApiError = RuntimeError::Duplicate {
            transaction_id: "TXN1".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = RuntimeError::InvalidTransition {
            action: "acknowledge",
            from: AlertStatus::Resolved,
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError =
            RuntimeError::Validation(CoreError::invalid_value("amount", "negative")).into();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_repository_error_conversion() {
        let err: ApiError = RepositoryError::NotFound {
            id: "TXN9".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
