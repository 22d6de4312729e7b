//! `release-relay verify`: fetch a relay's releases with both client styles
//! and check every name against the release pattern.

use anyhow::Context;
use client::{BlockingReleasesClient, ClientError, StreamingReleasesClient};
use releases::{check_release_names, Release, ReleaseNamePattern};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ReportFormat, VerifyArgs};

/// Outcome of checking one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointCheck {
    pub endpoint: &'static str,
    pub passed: bool,
    pub checked: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of a whole verify run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyReport {
    pub server: String,
    pub pattern: String,
    pub checks: Vec<EndpointCheck>,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    pub fn render(&self, format: ReportFormat) -> anyhow::Result<String> {
        match format {
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).context("failed to encode report")
            }
            ReportFormat::Text => Ok(self
                .checks
                .iter()
                .map(|check| match &check.error {
                    None => format!("{}: ok ({} releases)", check.endpoint, check.checked),
                    Some(error) => format!("{}: FAILED: {error}", check.endpoint),
                })
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }
}

/// Runs the checks selected by `args`.
pub async fn run(args: &VerifyArgs) -> anyhow::Result<VerifyReport> {
    let pattern = match &args.pattern {
        Some(pattern) => ReleaseNamePattern::new(pattern)
            .with_context(|| format!("invalid --pattern '{pattern}'"))?,
        None => ReleaseNamePattern::default(),
    };

    let mut checks = Vec::new();
    if args.mode.includes_blocking() {
        let fetched = fetch_blocking(&args.server).await;
        checks.push(evaluate(
            client::RELEASES_LOWLEVEL_PATH,
            fetched,
            &pattern,
            !args.allow_empty,
        ));
    }
    if args.mode.includes_streaming() {
        let fetched = fetch_streaming(&args.server).await;
        checks.push(evaluate(
            client::RELEASES_STREAM_PATH,
            fetched,
            &pattern,
            false,
        ));
    }

    Ok(VerifyReport {
        server: args.server.clone(),
        pattern: pattern.as_str().to_string(),
        checks,
    })
}

async fn fetch_blocking(server: &str) -> Result<Vec<Release>, String> {
    let server = server.to_string();
    let joined = tokio::task::spawn_blocking(move || {
        BlockingReleasesClient::new(&server)?.exchange_releases()
    })
    .await;

    match joined {
        Ok(Ok(response)) => Ok(response.releases),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) => Err(format!("blocking client task failed: {e}")),
    }
}

async fn fetch_streaming(server: &str) -> Result<Vec<Release>, String> {
    let fetched: Result<Vec<Release>, ClientError> = async {
        StreamingReleasesClient::new(server)?.collect_releases().await
    }
    .await;
    fetched.map_err(|e| e.to_string())
}

fn evaluate(
    endpoint: &'static str,
    fetched: Result<Vec<Release>, String>,
    pattern: &ReleaseNamePattern,
    require_non_empty: bool,
) -> EndpointCheck {
    let outcome = fetched.and_then(|releases| {
        check_release_names(pattern, &releases, require_non_empty).map_err(|e| e.to_string())
    });

    match outcome {
        Ok(checked) => {
            info!(endpoint, checked, "Release names verified");
            EndpointCheck {
                endpoint,
                passed: true,
                checked,
                error: None,
            }
        }
        Err(error) => {
            warn!(endpoint, %error, "Release verification failed");
            EndpointCheck {
                endpoint,
                passed: false,
                checked: 0,
                error: Some(error),
            }
        }
    }
}
