//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::report::ComposeError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream failure: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::Upstream(detail) => {
                tracing::warn!(detail, "upstream dependency failure");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_FAILED", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::InvalidTransition { from, to } => {
                ApiError::Conflict(format!("cannot move submission from {from} to {to}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ComposeError> for ApiError {
    fn from(err: ComposeError) -> Self {
        match err {
            ComposeError::PrerequisiteNotMet => {
                ApiError::BadRequest("Submission not found or not yet annotated.".into())
            }
            ComposeError::AssetFetchFailed(e) => ApiError::Upstream(e.to_string()),
            ComposeError::SinkUploadFailed(e) => ApiError::Upstream(e.to_string()),
            ComposeError::PersistFailed { url, reason } => ApiError::Internal(format!(
                "report stored at {url} but submission update failed: {reason}"
            )),
            ComposeError::Render(reason) => ApiError::Internal(reason),
        }
    }
}
