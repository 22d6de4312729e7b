//! Release Relay GitHub infrastructure adapter.
//!
//! Implements [`releases::ReleaseSource`] against the GitHub REST API
//! (`GET /repos/{owner}/{repo}/releases`) using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (authentication, rate limiting, pagination, the
//! shape of GitHub's release payload) are handled here; the [`releases`]
//! crate never sees them.
//!
//! ## Pagination
//!
//! [`GithubClient::list_releases`](releases::ReleaseSource::list_releases)
//! returns the first page only. [`GithubClient::stream_releases`](releases::ReleaseSource::stream_releases)
//! walks pages on demand and stops after a short page or after
//! [`GithubConfig::max_pages`] pages.

use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use releases::{
    Release, ReleaseSource, ReleaseSourceError, ReleaseStream, RepositoryId, Timestamp,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Default base URL of the GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json, application/json";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection settings for [`GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// Base URL of the API, without a trailing `/repos` path.
    pub api_url: String,

    /// Personal access or installation token. Anonymous when `None`.
    pub token: Option<String>,

    /// `User-Agent` header value; GitHub rejects requests without one.
    pub user_agent: String,

    /// Page size requested from GitHub (GitHub caps this at 100).
    pub per_page: u32,

    /// Upper bound on the number of pages a stream will fetch.
    pub max_pages: u32,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: concat!("release-relay/", env!("CARGO_PKG_VERSION")).to_string(),
            per_page: 30,
            max_pages: 10,
        }
    }
}

/// Errors raised while constructing a [`GithubClient`].
#[derive(Debug, Error)]
pub enum GithubError {
    /// A configuration value is unusable.
    #[error("Invalid GitHub configuration: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The underlying HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// The subset of GitHub's release payload the relay uses.
#[derive(Debug, Deserialize)]
struct GithubRelease {
    name: Option<String>,
    tag_name: String,
    html_url: Option<String>,
    #[serde(default)]
    prerelease: bool,
    published_at: Option<Timestamp>,
}

impl From<GithubRelease> for Release {
    fn from(release: GithubRelease) -> Self {
        // GitHub allows untitled releases; the tag stands in for the name.
        let name = match release.name {
            Some(name) if !name.trim().is_empty() => name,
            _ => release.tag_name.clone(),
        };
        Release {
            name,
            tag_name: release.tag_name,
            html_url: release.html_url,
            prerelease: release.prerelease,
            published_at: release.published_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// GitHub-backed [`ReleaseSource`].
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    per_page: u32,
    max_pages: u32,
}

impl GithubClient {
    /// Builds a client from `config`.
    pub fn new(config: GithubConfig) -> Result<Self, GithubError> {
        if config.per_page == 0 || config.per_page > 100 {
            return Err(GithubError::Configuration {
                message: format!("per_page must be in 1..=100, got {}", config.per_page),
            });
        }
        if config.max_pages == 0 {
            return Err(GithubError::Configuration {
                message: "max_pages must be at least 1".to_string(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| {
                GithubError::Configuration {
                    message: format!("invalid user agent: {e}"),
                }
            })?,
        );
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                GithubError::Configuration {
                    message: format!("invalid token: {e}"),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            max_pages: config.max_pages,
        })
    }

    /// Fetches page `page` (1-based) of the repository's releases.
    #[instrument(skip(self, repository), fields(repository = %repository))]
    pub async fn fetch_page(
        &self,
        repository: &RepositoryId,
        page: u32,
    ) -> Result<Vec<Release>, ReleaseSourceError> {
        let url = format!(
            "{}/repos/{}/{}/releases",
            self.api_url,
            repository.owner(),
            repository.name()
        );
        let response = self
            .http
            .get(&url)
            .query(&[("per_page", self.per_page), ("page", page)])
            .send()
            .await
            .map_err(|e| ReleaseSourceError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            let err = classify_failure(
                status,
                &headers,
                &body,
                repository,
                chrono::Utc::now().timestamp(),
            );
            warn!(status = status.as_u16(), error = %err, "GitHub releases request failed");
            return Err(err);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ReleaseSourceError::Transport {
                message: e.to_string(),
            })?;
        let releases: Vec<GithubRelease> =
            serde_json::from_slice(&body).map_err(|e| ReleaseSourceError::InvalidResponse {
                message: e.to_string(),
            })?;

        debug!(count = releases.len(), "Fetched GitHub releases page");
        Ok(releases.into_iter().map(Release::from).collect())
    }

    fn is_last_page(&self, page: u32, received: usize) -> bool {
        received < self.per_page as usize || page >= self.max_pages
    }
}

#[async_trait]
impl ReleaseSource for GithubClient {
    async fn list_releases(
        &self,
        repository: &RepositoryId,
    ) -> Result<Vec<Release>, ReleaseSourceError> {
        self.fetch_page(repository, 1).await
    }

    fn stream_releases(&self, repository: &RepositoryId) -> ReleaseStream {
        let client = self.clone();
        let repository = repository.clone();
        stream::try_unfold(Some(1u32), move |next| {
            let client = client.clone();
            let repository = repository.clone();
            async move {
                let Some(page) = next else {
                    return Ok::<_, ReleaseSourceError>(None);
                };
                let releases = client.fetch_page(&repository, page).await?;
                let next = if client.is_last_page(page, releases.len()) {
                    None
                } else {
                    Some(page + 1)
                };
                let items = releases.into_iter().map(Ok::<_, ReleaseSourceError>);
                Ok(Some((stream::iter(items), next)))
            }
        })
        .try_flatten()
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

/// Maps a non-success GitHub response onto a [`ReleaseSourceError`].
///
/// GitHub signals primary rate limits with `403`/`429` and
/// `x-ratelimit-remaining: 0` plus an `x-ratelimit-reset` epoch, and
/// secondary limits with `retry-after` seconds. `now` is the current Unix time.
fn classify_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    repository: &RepositoryId,
    now: i64,
) -> ReleaseSourceError {
    if status == StatusCode::NOT_FOUND {
        return ReleaseSourceError::NotFound {
            repository: repository.clone(),
        };
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
    };
    let retry_after = header(RETRY_AFTER.as_str());
    let remaining = header("x-ratelimit-remaining");
    let reset = header("x-ratelimit-reset");

    let limited = matches!(status, StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS)
        && (retry_after.is_some() || remaining == Some(0));
    if limited {
        let delay = retry_after
            .or_else(|| reset.map(|reset| reset - now))
            .map(|secs| Duration::from_secs(secs.max(0) as u64));
        return ReleaseSourceError::RateLimited { retry_after: delay };
    }

    ReleaseSourceError::Upstream {
        status: status.as_u16(),
        message: upstream_message(body, status),
    }
}

/// Extracts GitHub's `{"message": ...}` text, falling back to the raw body or
/// the status reason.
fn upstream_message(body: &str, status: StatusCode) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryId {
        RepositoryId::new("micronaut-projects/micronaut-core").unwrap()
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn untitled_release_falls_back_to_tag() {
        let raw: GithubRelease =
            serde_json::from_str(r#"{"name": null, "tag_name": "v3.4.0"}"#).unwrap();
        assert_eq!(Release::from(raw).name, "v3.4.0");

        let blank: GithubRelease =
            serde_json::from_str(r#"{"name": "  ", "tag_name": "v3.4.1"}"#).unwrap();
        assert_eq!(Release::from(blank).name, "v3.4.1");
    }

    #[test]
    fn not_found_names_the_repository() {
        let err = classify_failure(StatusCode::NOT_FOUND, &HeaderMap::new(), "", &repo(), 0);
        assert!(matches!(err, ReleaseSourceError::NotFound { repository } if repository == repo()));
    }

    #[test]
    fn exhausted_primary_limit_waits_until_reset() {
        let err = classify_failure(
            StatusCode::FORBIDDEN,
            &headers(&[("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "1100")]),
            r#"{"message": "API rate limit exceeded"}"#,
            &repo(),
            1000,
        );
        assert!(matches!(
            err,
            ReleaseSourceError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(100)
        ));
    }

    #[test]
    fn secondary_limit_uses_retry_after() {
        let err = classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            &headers(&[("retry-after", "7")]),
            "",
            &repo(),
            0,
        );
        assert!(matches!(
            err,
            ReleaseSourceError::RateLimited { retry_after: Some(d) } if d == Duration::from_secs(7)
        ));
    }

    #[test]
    fn plain_forbidden_is_an_upstream_error_with_github_message() {
        let err = classify_failure(
            StatusCode::FORBIDDEN,
            &headers(&[("x-ratelimit-remaining", "59")]),
            r#"{"message": "Resource not accessible by integration"}"#,
            &repo(),
            0,
        );
        match err {
            ReleaseSourceError::Upstream { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Resource not accessible by integration");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_body_uses_status_reason() {
        assert_eq!(
            upstream_message("", StatusCode::BAD_GATEWAY),
            "Bad Gateway".to_string()
        );
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        let config = GithubConfig {
            per_page: 0,
            ..GithubConfig::default()
        };
        assert!(matches!(
            GithubClient::new(config),
            Err(GithubError::Configuration { .. })
        ));
    }
}
