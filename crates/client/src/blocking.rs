//! Blocking client for the JSON array endpoint.

use releases::Release;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::{endpoint, ClientError, RELEASES_LOWLEVEL_PATH};

/// A fully materialised response from the JSON array endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasesResponse {
    /// Status the relay answered with (always a success status).
    pub status: StatusCode,
    /// Release records in the order the relay returned them.
    pub releases: Vec<Release>,
}

/// Synchronous client for `GET /github/releases-lowlevel`.
///
/// Must not be created, used or dropped on an async runtime worker thread;
/// from async code, wrap calls in `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct BlockingReleasesClient {
    http: reqwest::blocking::Client,
    url: String,
}

impl BlockingReleasesClient {
    /// Creates a client for the relay at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder().build()?;
        Ok(Self {
            http,
            url: endpoint(base_url, RELEASES_LOWLEVEL_PATH),
        })
    }

    /// Fetches the release array, blocking until the whole body has arrived.
    #[instrument(skip(self), fields(url = %self.url))]
    pub fn exchange_releases(&self) -> Result<ReleasesResponse, ClientError> {
        let response = self
            .http
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let body = response.bytes()?;
        let releases: Vec<Release> = serde_json::from_slice(&body)?;
        debug!(status = status.as_u16(), count = releases.len(), "Received releases");
        Ok(ReleasesResponse { status, releases })
    }
}
