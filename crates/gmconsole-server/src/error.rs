//! Game-master console server error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gmconsole_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Content could not be loaded at startup.
    #[error("content error: {0}")]
    Content(#[from] DomainError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The session executor has stopped and no longer accepts requests.
    #[error("session executor is not running")]
    SessionClosed,
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

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Content(inner) => Self(inner),
            other => Self(DomainError::Infrastructure(other.to_string())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::UnknownCommand(_) => (StatusCode::BAD_REQUEST, "unknown_command"),
            DomainError::Arity { .. } => (StatusCode::BAD_REQUEST, "arity_error"),
            DomainError::InvalidNumber(_) | DomainError::InvalidArgument(_) => {
                (StatusCode::BAD_REQUEST, "invalid_argument")
            }
            DomainError::InvalidDice(_) => (StatusCode::BAD_REQUEST, "invalid_dice"),
            DomainError::EntityNotFound(_) => (StatusCode::NOT_FOUND, "entity_not_found"),
            DomainError::Validation(_) => (StatusCode::CONFLICT, "validation_error"),
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
