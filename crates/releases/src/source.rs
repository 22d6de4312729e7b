//! The port through which the relay obtains releases.
//!
//! Implemented by `github::GithubClient` in production and by in-memory
//! sources in tests.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{Release, ReleaseSourceError, RepositoryId};

/// A lazy, finite, non-restartable sequence of release records.
///
/// The stream ends after the last record; an `Err` item means the upstream
/// failed and no further items follow.
pub type ReleaseStream = BoxStream<'static, Result<Release, ReleaseSourceError>>;

/// Supplies the releases of a repository.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches one fully materialised page of releases, newest first.
    async fn list_releases(
        &self,
        repository: &RepositoryId,
    ) -> Result<Vec<Release>, ReleaseSourceError>;

    /// Returns every release of `repository` as a lazy stream, newest first.
    ///
    /// No upstream request is made until the stream is first polled.
    fn stream_releases(&self, repository: &RepositoryId) -> ReleaseStream;
}

#[cfg(test)]
mod tests {
    use futures::{stream, StreamExt, TryStreamExt};

    use super::*;

    struct Fixed(Vec<Release>);

    #[async_trait]
    impl ReleaseSource for Fixed {
        async fn list_releases(
            &self,
            _repository: &RepositoryId,
        ) -> Result<Vec<Release>, ReleaseSourceError> {
            Ok(self.0.clone())
        }

        fn stream_releases(&self, _repository: &RepositoryId) -> ReleaseStream {
            stream::iter(self.0.clone().into_iter().map(Ok)).boxed()
        }
    }

    #[tokio::test]
    async fn source_is_usable_as_trait_object() {
        let source: Box<dyn ReleaseSource> = Box::new(Fixed(vec![
            Release::named("Micronaut 3.4.0"),
            Release::named("Micronaut 3.3.4"),
        ]));
        let repository = RepositoryId::new("micronaut-projects/micronaut-core").unwrap();

        let listed = source.list_releases(&repository).await.unwrap();
        let streamed: Vec<Release> = source
            .stream_releases(&repository)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(listed, streamed);
    }
}
