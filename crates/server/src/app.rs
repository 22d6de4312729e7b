//! Router, handlers and the serve loop.

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::{stream, StreamExt, TryStreamExt};
use releases::{Release, ReleaseSource, RepositoryId};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::{ApiError, ServerError, StreamError};

/// Media type of the streaming endpoint: JSON objects separated by newlines.
pub const JSON_STREAM: &str = "application/x-json-stream";

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Shared, immutable handler state.
#[derive(Clone)]
pub struct AppState {
    source: Arc<dyn ReleaseSource>,
    repository: RepositoryId,
}

impl AppState {
    /// Creates state relaying `repository` from `source`.
    pub fn new(source: Arc<dyn ReleaseSource>, repository: RepositoryId) -> Self {
        Self { source, repository }
    }

    /// Returns the relayed repository.
    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }
}

/// Builds the relay's router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/github/releases-lowlevel", get(releases_lowlevel))
        .route("/github/releases", get(releases_stream))
        .route("/health", get(health))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

/// Serves the relay on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, repository = %state.repository, "Release relay listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Release relay stopped");
    Ok(())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn releases_lowlevel(State(state): State<AppState>) -> Result<Json<Vec<Release>>, ApiError> {
    let releases = state.source.list_releases(&state.repository).await?;
    info!(count = releases.len(), "Relayed releases");
    Ok(Json(releases))
}

async fn releases_stream(State(state): State<AppState>) -> Response {
    let mut upstream = state.source.stream_releases(&state.repository);

    // Pull the first record before committing to a 200 so that an upstream
    // that fails immediately still gets a proper error status.
    let first = match upstream.next().await {
        Some(Err(err)) => return ApiError::from(err).into_response(),
        first => first,
    };

    let lines = stream::iter(first)
        .chain(upstream)
        .map_err(StreamError::from)
        .and_then(|release| async move { encode_line(&release) })
        .inspect_err(|err| warn!(error = %err, "Release stream aborted"));

    (
        StatusCode::OK,
        [(CONTENT_TYPE, HeaderValue::from_static(JSON_STREAM))],
        Body::from_stream(lines),
    )
        .into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn encode_line(release: &Release) -> Result<Vec<u8>, StreamError> {
    let mut line = serde_json::to_vec(release)?;
    line.push(b'\n');
    Ok(line)
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Tags each request with a correlation id (the caller's, or a fresh UUID),
/// records it on the request span and echoes it on the response.
async fn request_id(request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let span = info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %id,
    );

    async move {
        let mut response = next.run(request).await;
        if let Ok(value) = HeaderValue::from_str(&id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        info!(status = response.status().as_u16(), "Request completed");
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_line_is_newline_terminated_json() {
        let line = encode_line(&Release::named("Micronaut 3.4.0")).unwrap();
        assert_eq!(line.last(), Some(&b'\n'));
        let decoded: Release = serde_json::from_slice(&line).unwrap();
        assert_eq!(decoded.name, "Micronaut 3.4.0");
    }
}
