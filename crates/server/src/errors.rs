//! HTTP error mapping for the relay.

use axum::http::{header::RETRY_AFTER, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use releases::ReleaseSourceError;
use serde_json::json;
use thiserror::Error;

/// Errors that stop the server itself.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding, accepting or serving on the socket failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that terminate a streamed response body part-way through.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The upstream failed after the response head was sent.
    #[error(transparent)]
    Source(#[from] ReleaseSourceError),

    /// A release record could not be encoded.
    #[error("Failed to encode release: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An upstream failure rendered as an HTTP response.
///
/// | Source error | Status | `error` code |
/// |--------------|--------|--------------|
/// | `NotFound` | 404 | `REPOSITORY_NOT_FOUND` |
/// | `RateLimited` | 503 (+ `Retry-After`) | `UPSTREAM_RATE_LIMITED` |
/// | anything else | 502 | `UPSTREAM_ERROR` |
#[derive(Debug)]
pub struct ApiError(pub ReleaseSourceError);

impl From<ReleaseSourceError> for ApiError {
    fn from(err: ReleaseSourceError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            ReleaseSourceError::NotFound { .. } => (StatusCode::NOT_FOUND, "REPOSITORY_NOT_FOUND"),
            ReleaseSourceError::RateLimited { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_RATE_LIMITED")
            }
            ReleaseSourceError::Upstream { .. }
            | ReleaseSourceError::InvalidResponse { .. }
            | ReleaseSourceError::Transport { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let mut response = (
            status,
            Json(json!({
                "error": code,
                "message": self.0.to_string()
            })),
        )
            .into_response();

        if let ReleaseSourceError::RateLimited {
            retry_after: Some(delay),
        } = &self.0
        {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(delay.as_secs()));
        }
        response
    }
}
