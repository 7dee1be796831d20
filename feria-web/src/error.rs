//! API error types for feria-web

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Step or row validation failed (422)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Lead already submitted (409)
    #[error("Already submitted: {0}")]
    AlreadySubmitted(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<feria_common::Error> for ApiError {
    fn from(err: feria_common::Error) -> Self {
        match err {
            feria_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            feria_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            feria_common::Error::AlreadySubmitted(msg) => ApiError::AlreadySubmitted(msg),
            feria_common::Error::Io(err) => ApiError::Io(err),
            // Database and config details stay in the logs, not in responses
            feria_common::Error::Database(err) => {
                tracing::error!("Database error: {}", err);
                ApiError::Internal("A storage error occurred, please retry".to_string())
            }
            feria_common::Error::Config(msg) => ApiError::Internal(msg),
            feria_common::Error::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION", msg),
            ApiError::AlreadySubmitted(msg) => (StatusCode::CONFLICT, "ALREADY_SUBMITTED", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
