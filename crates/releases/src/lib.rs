//! Core domain for Release Relay.
//!
//! This crate contains the release record, the repository identifier, the
//! release-name pattern used by acceptance checks, the [`ReleaseSource`] port
//! trait, and the error types shared by every other crate in the workspace.
//! Infrastructure crates implement the traits defined here; they never add
//! domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype domain identifiers (`RepositoryId`) |
//! | [`types`] | Value types (`Release`, `Timestamp`) |
//! | [`pattern`] | Release-name pattern and the acceptance check |
//! | [`source`] | The [`ReleaseSource`] port trait and [`ReleaseStream`] |
//! | [`errors`] | Error and retry-policy types |

pub mod errors;
pub mod identifiers;
pub mod pattern;
pub mod source;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ReleaseCheckError, ReleaseSourceError, RetryPolicy};
pub use identifiers::RepositoryId;
pub use pattern::{check_release_names, ReleaseNamePattern, MICRONAUT_RELEASE_PATTERN};
pub use source::{ReleaseSource, ReleaseStream};
pub use types::{Release, Timestamp};
