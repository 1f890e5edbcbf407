//! Error handling for the HTTP API
//!
//! Every error body has the shape `{"detail": "..."}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cadence_core::StorageError;
use tracing::error;

/// Message returned for unknown review items
pub const ITEM_NOT_FOUND: &str = "Review item not found";

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    /// Well-formed request rejected by a domain rule
    #[error("{0}")]
    Unprocessable(String),
    /// Logged in full, reported generically
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => ApiError::NotFound(ITEM_NOT_FOUND.to_string()),
            StorageError::Quality(e) => ApiError::Unprocessable(e.to_string()),
            StorageError::InvalidInput(msg) => ApiError::BadRequest(msg),
            StorageError::AlreadyExists(id) => {
                ApiError::Conflict(format!("Review item already exists: {}", id))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("storage task failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                "Internal server error".to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::Unprocessable(msg) => msg,
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}
