//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use quizgate_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            DomainError::StaleAnswer { .. } => (StatusCode::CONFLICT, "stale_answer"),
            DomainError::SessionExpired(_) => (StatusCode::GONE, "session_expired"),
            DomainError::InvalidDepartment(_) => (StatusCode::BAD_REQUEST, "invalid_department"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            DomainError::StorageUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use quizgate_test_support::user_id;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::NotFound("user 7".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_stale_answer_maps_to_409() {
        assert_eq!(
            status_of(DomainError::StaleAnswer {
                expected: 5,
                claimed: 4,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_session_expired_maps_to_410() {
        assert_eq!(
            status_of(DomainError::SessionExpired(user_id(1))),
            StatusCode::GONE
        );
    }

    #[test]
    fn test_bad_input_maps_to_400() {
        assert_eq!(
            status_of(DomainError::InvalidDepartment("Math".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        assert_eq!(
            status_of(DomainError::Forbidden("admin only".into())),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_storage_unavailable_maps_to_503() {
        assert_eq!(
            status_of(DomainError::StorageUnavailable("timeout".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
