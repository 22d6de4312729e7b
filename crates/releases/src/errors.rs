//! Error and retry-policy types for the Release Relay domain.
//!
//! [`ReleaseSourceError`] covers every way an upstream release source can
//! fail. [`ReleaseCheckError`] is produced by the acceptance check in
//! [`crate::pattern`]. Transport-specific errors (HTTP client construction,
//! server binding) live in their respective infrastructure crates.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that participates
//! in retry decisions must be able to produce a [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RepositoryId;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Nothing in the workspace retries automatically; the policy is surfaced so
/// callers (and the relay's `Retry-After` header) can act on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

// ---------------------------------------------------------------------------
// Release source errors
// ---------------------------------------------------------------------------

/// Errors produced by a [`crate::ReleaseSource`].
#[derive(Debug, Error)]
pub enum ReleaseSourceError {
    /// The upstream does not know the requested repository.
    #[error("Repository not found: {repository}")]
    NotFound {
        /// The repository that was requested.
        repository: RepositoryId,
    },

    /// The upstream refused the request because a rate limit was exhausted.
    #[error("Upstream rate limit exceeded")]
    RateLimited {
        /// Delay until the limit resets, when the upstream reported one.
        retry_after: Option<Duration>,
    },

    /// The upstream answered with an unexpected, non-success status.
    #[error("Upstream returned status {status}: {message}")]
    Upstream {
        /// HTTP status code returned by the upstream.
        status: u16,
        /// Body or reason text returned by the upstream.
        message: String,
    },

    /// The upstream answered successfully but the body could not be decoded.
    #[error("Invalid upstream response: {message}")]
    InvalidResponse {
        /// Description of the decoding failure.
        message: String,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },
}

impl ReleaseSourceError {
    /// Returns whether the failed operation may be retried.
    ///
    /// Rate limits and transport failures are transient; 5xx statuses are
    /// treated as transient too. Everything else needs a configuration change.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Transport { .. } => RetryPolicy::Retryable { after: None },
            Self::Upstream { status, .. } if *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            Self::NotFound { .. } | Self::Upstream { .. } | Self::InvalidResponse { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Acceptance check errors
// ---------------------------------------------------------------------------

/// Failures reported by [`crate::check_release_names`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReleaseCheckError {
    /// No release records were returned although at least one was required.
    #[error("No releases were returned")]
    Empty,

    /// One or more release names did not match the pattern.
    #[error("{} release name(s) do not match /{pattern}/: {}", .names.len(), .names.join(", "))]
    NameMismatch {
        /// The pattern the names were checked against.
        pattern: String,
        /// Every non-matching name, in input order.
        names: Vec<String>,
    },
}
