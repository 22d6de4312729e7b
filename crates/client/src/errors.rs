//! Client-side error type.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while calling a relay.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay answered with a non-success status.
    #[error("Relay returned status {status}: {body}")]
    Status {
        /// Status returned by the relay.
        status: StatusCode,
        /// Response body, usually the relay's JSON error document.
        body: String,
    },

    /// The request could not be sent or the body could not be read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The body was not valid JSON of the expected shape.
    #[error("Failed to decode releases: {0}")]
    Decode(#[from] serde_json::Error),
}
