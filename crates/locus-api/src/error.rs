//! Error types for the HTTP layer.
//!
//! [`ApiError`] unifies every request rejection into a single enum that
//! converts into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. The relay
//! core itself never fails; everything here is input validation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use locus_types::{RecordError, TimestampError};

/// Errors that can occur in the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body was not a well-formed update envelope.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The record parsed but failed validation.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// No route matched.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<TimestampError> for ApiError {
    fn from(e: TimestampError) -> Self {
        Self::InvalidQuery(format!("since: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidPayload(_) | Self::InvalidRecord(_) | Self::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
