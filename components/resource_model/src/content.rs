// Deferred content retrieval for resources still in flight

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use inspector_types::ContentError;

/// Retrieved resource content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    /// Content body (text, or base64 encoded binary)
    pub body: String,
    /// Whether `body` is base64 encoded
    pub base64_encoded: bool,
}

/// Capability for fetching the bytes of one resource.
///
/// Supplied externally per resource; how the host locates the content
/// (request identifier, or parent frame plus URL) is the host's concern.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the content of the resource this capability was created for
    async fn fetch_content(&self) -> Result<ResourceContent, ContentError>;
}

/// Outcome of a content request
pub type ContentResult = Result<ResourceContent, ContentError>;

/// Shareable one-shot content future; clones observe the same outcome
pub type ContentFuture = Shared<BoxFuture<'static, ContentResult>>;

/// Completion state broadcast to deferred content requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    Pending,
    Finished,
    Failed,
}

pub(crate) fn ready_content(result: ContentResult) -> ContentFuture {
    futures::future::ready(result).boxed().shared()
}

pub(crate) fn fetch_content(fetcher: Arc<dyn ContentFetcher>) -> ContentFuture {
    async move { fetcher.fetch_content().await }.boxed().shared()
}

/// Wait for the terminal transition, then fetch (finish) or reject with the
/// fixed loading-failure message (fail). Created at most once per resource
/// and shared by every caller, so only one downstream fetch occurs.
pub(crate) fn content_after_completion(
    mut completion: watch::Receiver<Completion>,
    fetcher: Arc<dyn ContentFetcher>,
) -> ContentFuture {
    async move {
        loop {
            // Copy the state out so the watch guard is not held across awaits.
            let state = *completion.borrow();
            match state {
                Completion::Finished => return fetcher.fetch_content().await,
                Completion::Failed => return Err(ContentError::LoadingFailed),
                Completion::Pending => {}
            }
            if completion.changed().await.is_err() {
                // The resource was dropped while still pending.
                return Err(ContentError::LoadingFailed);
            }
        }
    }
    .boxed()
    .shared()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticFetcher;

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch_content(&self) -> ContentResult {
            Ok(ResourceContent {
                body: "<html></html>".to_string(),
                base64_encoded: false,
            })
        }
    }

    #[tokio::test]
    async fn test_ready_content_resolves_immediately() {
        let future = ready_content(Err(ContentError::LoadingFailed));
        assert_eq!(future.await, Err(ContentError::LoadingFailed));
    }

    #[tokio::test]
    async fn test_content_waits_for_completion() {
        let (tx, rx) = watch::channel(Completion::Pending);
        let future = content_after_completion(rx, Arc::new(StaticFetcher));

        // Still pending: polling must not complete.
        assert!(future.clone().now_or_never().is_none());

        tx.send(Completion::Finished).unwrap();
        let content = future.await.unwrap();
        assert_eq!(content.body, "<html></html>");
        assert!(!content.base64_encoded);
    }

    #[tokio::test]
    async fn test_failure_rejects_with_fixed_message() {
        let (tx, rx) = watch::channel(Completion::Pending);
        let future = content_after_completion(rx, Arc::new(StaticFetcher));

        tx.send(Completion::Failed).unwrap();
        assert_eq!(future.await, Err(ContentError::LoadingFailed));
    }

    #[tokio::test]
    async fn test_dropped_resource_rejects() {
        let (tx, rx) = watch::channel(Completion::Pending);
        let future = content_after_completion(rx, Arc::new(StaticFetcher));
        drop(tx);
        assert_eq!(future.await, Err(ContentError::LoadingFailed));
    }
}
