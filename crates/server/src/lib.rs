//! Release Relay HTTP surface.
//!
//! Binds an HTTP server that relays the releases of one configured repository
//! from a [`releases::ReleaseSource`]:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /github/releases-lowlevel` | `application/json` array, one upstream page fetched eagerly |
//! | `GET /github/releases` | `application/x-json-stream`, one JSON object per line, produced while upstream pages are fetched |
//! | `GET /health` | `{"status":"ok"}` |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Routing, content negotiation and the mapping of
//! [`releases::ReleaseSourceError`] onto HTTP statuses live here. The upstream
//! itself is a trait object, so this crate never sees GitHub details.

pub mod app;
pub mod errors;

pub use app::{build_router, serve, AppState, JSON_STREAM, REQUEST_ID_HEADER};
pub use errors::{ApiError, ServerError};
