//! Release Relay client adapters.
//!
//! Two ways to read a relay's releases:
//!
//! - [`BlockingReleasesClient`] calls `GET /github/releases-lowlevel` on the
//!   calling thread and returns the fully materialised JSON array together
//!   with the response status.
//! - [`StreamingReleasesClient`] calls `GET /github/releases` and decodes the
//!   `application/x-json-stream` body lazily, one record at a time, as chunks
//!   arrive.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport and incremental JSON framing live here;
//! callers only see [`releases::Release`] values.

pub mod blocking;
pub mod decode;
pub mod errors;
pub mod streaming;

pub use blocking::{BlockingReleasesClient, ReleasesResponse};
pub use decode::JsonStreamDecoder;
pub use errors::ClientError;
pub use streaming::{ReleaseJsonStream, StreamingReleasesClient};

/// Path of the eager JSON array endpoint.
pub const RELEASES_LOWLEVEL_PATH: &str = "/github/releases-lowlevel";

/// Path of the JSON stream endpoint.
pub const RELEASES_STREAM_PATH: &str = "/github/releases";

/// Media type requested from the JSON stream endpoint.
pub const JSON_STREAM: &str = "application/x-json-stream";

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
