//! Error types for the HTTP API.
//!
//! [`ApiError`] converts into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body has the shape `{"error": "<message>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use racetime_store::StoreError;
use tracing::warn;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No snapshot has been published yet.
    #[error("no snapshot yet")]
    NoSnapshot,

    /// The backing store failed to answer.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The request body or query could not be accepted.
    #[error("{0}")]
    InvalidRequest(String),

    /// A query string parameter could not be parsed.
    #[error("{0}")]
    InvalidQuery(String),

    /// The server was started without an event log.
    #[error("event log not configured")]
    EventsDisabled,
}

impl ApiError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoSnapshot | Self::EventsDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Store(e) = &self {
            warn!(error = %e, "Store request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
