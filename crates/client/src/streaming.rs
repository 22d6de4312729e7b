//! Streaming client for the JSON stream endpoint.

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, TryStreamExt};
use releases::Release;
use reqwest::header::ACCEPT;
use tracing::{debug, instrument};

use crate::{endpoint, ClientError, JsonStreamDecoder, JSON_STREAM, RELEASES_STREAM_PATH};

/// Lazily decoded release records from a relay.
pub type ReleaseJsonStream = BoxStream<'static, Result<Release, ClientError>>;

/// Async client for `GET /github/releases`.
#[derive(Debug, Clone)]
pub struct StreamingReleasesClient {
    http: reqwest::Client,
    url: String,
}

impl StreamingReleasesClient {
    /// Creates a client for the relay at `base_url` (e.g. `http://127.0.0.1:8080`).
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            url: endpoint(base_url, RELEASES_STREAM_PATH),
        })
    }

    /// Returns the relay's releases as a lazy stream.
    ///
    /// The request is sent when the stream is first polled. Records are
    /// yielded as soon as their bytes arrive; the stream ends with the body.
    pub fn json_stream(&self) -> ReleaseJsonStream {
        let request = self
            .http
            .get(&self.url)
            .header(ACCEPT, JSON_STREAM);

        stream::once(async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ClientError::Status { status, body });
            }
            Ok::<_, ClientError>(decode_releases(response.bytes_stream()))
        })
        .try_flatten()
        .boxed()
    }

    /// Drains [`json_stream`](Self::json_stream) into a `Vec`.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn collect_releases(&self) -> Result<Vec<Release>, ClientError> {
        let releases: Vec<Release> = self.json_stream().try_collect().await?;
        debug!(count = releases.len(), "Drained release stream");
        Ok(releases)
    }
}

/// Turns a body of byte chunks into a stream of decoded records.
fn decode_releases<S, B>(body: S) -> impl Stream<Item = Result<Release, ClientError>> + Send
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = (Box::pin(body), JsonStreamDecoder::<Release>::new());
    stream::try_unfold(state, |(mut body, mut decoder)| async move {
        let Some(chunk) = body.next().await else {
            decoder.finish()?;
            return Ok::<_, ClientError>(None);
        };
        let records = decoder.push(chunk?.as_ref())?;
        let records = stream::iter(records.into_iter().map(Ok::<_, ClientError>));
        Ok(Some((records, (body, decoder))))
    })
    .try_flatten()
}
