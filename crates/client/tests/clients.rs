//! Client behaviour against hand-rolled relays: error statuses, chunked
//! bodies, truncated and aborted bodies, laziness.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use client::{BlockingReleasesClient, ClientError, StreamingReleasesClient, JSON_STREAM};
use futures::{stream, StreamExt};
use releases::Release;
use serde_json::json;
use tokio::net::TcpListener;

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A relay whose stream endpoint sends `chunks` verbatim, one body frame each.
async fn chunked_relay(chunks: &'static [&'static str]) -> String {
    spawn(Router::new().route(
        "/github/releases",
        get(move || async move {
            let frames = stream::iter(chunks.iter().map(|c| Ok::<_, std::io::Error>(*c)));
            ([(CONTENT_TYPE, JSON_STREAM)], Body::from_stream(frames))
        }),
    ))
    .await
}

fn not_found_relay() -> Router {
    let not_found = || async {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "REPOSITORY_NOT_FOUND", "message": "Repository not found: octo/missing"})),
        )
            .into_response()
    };
    Router::new()
        .route("/github/releases-lowlevel", get(not_found))
        .route("/github/releases", get(not_found))
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_client_reports_error_status() {
    let relay = spawn(not_found_relay()).await;

    let err = tokio::task::spawn_blocking(move || {
        BlockingReleasesClient::new(&relay)?.exchange_releases()
    })
    .await
    .unwrap()
    .unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert!(body.contains("REPOSITORY_NOT_FOUND"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn blocking_client_rejects_malformed_body() {
    let relay = spawn(Router::new().route(
        "/github/releases-lowlevel",
        get(|| async { Json(json!({"name": "not an array"})) }),
    ))
    .await;

    let err = tokio::task::spawn_blocking(move || {
        BlockingReleasesClient::new(&relay)?.exchange_releases()
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(err, ClientError::Decode(_)));
}

#[tokio::test]
async fn streaming_client_reports_error_status() {
    let relay = spawn(not_found_relay()).await;

    let err = StreamingReleasesClient::new(&relay)
        .unwrap()
        .collect_releases()
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Status { status, .. } if status.as_u16() == 404));
}

#[tokio::test]
async fn streaming_client_reassembles_values_split_across_chunks() {
    let relay = chunked_relay(&[
        "{\"name\":\"Micronaut 3.4.0\"}\n{\"name\":\"Micro",
        "naut Framework 3.4.0 RC1\"}",
        "\n",
        "{\"name\":\"Micronaut 3.3.4\"}\n",
    ])
    .await;

    let releases = StreamingReleasesClient::new(&relay)
        .unwrap()
        .collect_releases()
        .await
        .unwrap();

    assert_eq!(
        releases,
        vec![
            Release::named("Micronaut 3.4.0"),
            Release::named("Micronaut Framework 3.4.0 RC1"),
            Release::named("Micronaut 3.3.4"),
        ]
    );
}

#[tokio::test]
async fn streaming_client_yields_records_before_a_truncated_tail_fails() {
    let relay = chunked_relay(&["{\"name\":\"Micronaut 3.4.0\"}\n{\"name\":\"Micro"]).await;

    let items: Vec<Result<Release, ClientError>> = StreamingReleasesClient::new(&relay)
        .unwrap()
        .json_stream()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().name, "Micronaut 3.4.0");
    assert!(matches!(items[1], Err(ClientError::Decode(_))));
}

#[tokio::test]
async fn streaming_client_reports_a_body_aborted_after_the_first_record() {
    let relay = spawn(Router::new().route(
        "/github/releases",
        get(|| async {
            let first = stream::iter([Ok::<_, std::io::Error>("{\"name\":\"Micronaut 3.4.0\"}\n")]);
            let abort = stream::once(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(std::io::Error::other("upstream went away"))
            });
            (
                [(CONTENT_TYPE, JSON_STREAM)],
                Body::from_stream(first.chain(abort)),
            )
        }),
    ))
    .await;

    let items: Vec<Result<Release, ClientError>> = StreamingReleasesClient::new(&relay)
        .unwrap()
        .json_stream()
        .collect()
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().name, "Micronaut 3.4.0");
    assert!(matches!(items[1], Err(ClientError::Transport(_))));
}

#[tokio::test]
async fn streaming_client_sends_nothing_until_polled() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let relay = spawn(Router::new().route(
        "/github/releases",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ([(CONTENT_TYPE, JSON_STREAM)], "")
            }
        }),
    ))
    .await;

    let client = StreamingReleasesClient::new(&relay).unwrap();
    let stream = client.json_stream();
    tokio::task::yield_now().await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    let releases: Vec<_> = stream.collect().await;
    assert!(releases.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
