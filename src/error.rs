//! Request-level error type.
//!
//! Source and cache failures never reach this type; they are absorbed into a
//! "not found" outcome or a cache miss. What remains are routing and input
//! errors, which are rendered as `{"error": "..."}` JSON bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No route or resource matches the request.
    #[error("Not found")]
    NotFound,

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        tracing::debug!(status = %status, error = %self, "request rejected");

        (status, axum::Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type alias using the crate Error type.
pub type Result<T> = std::result::Result<T, Error>;
