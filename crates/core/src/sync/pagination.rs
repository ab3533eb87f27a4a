//! Cursor pagination over a [`PageSource`]
//!
//! Pages are requested strictly one after another: the cursor from page N
//! becomes the request path for page N+1. Each request resolves the token
//! again and runs through the remote retry executor.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tidesync_domain::{Page, Result, SyncConfig, TideSyncError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::ports::PageSource;
use super::retry::{remote_retry, RemoteRetry};
use crate::auth::TokenSource;

/// Follows continuation cursors until the listing is exhausted
pub struct Paginator<T>
where
    T: Send + 'static,
{
    source: Arc<dyn PageSource<T>>,
    tokens: TokenSource,
    retry: RemoteRetry,
    page_delay: Duration,
    cancel: Option<CancellationToken>,
}

impl<T> Clone for Paginator<T>
where
    T: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            tokens: self.tokens.clone(),
            retry: self.retry.clone(),
            page_delay: self.page_delay,
            cancel: self.cancel.clone(),
        }
    }
}

impl<T> Paginator<T>
where
    T: Send + 'static,
{
    /// Paginator with default sync settings
    pub fn new(source: Arc<dyn PageSource<T>>, tokens: TokenSource) -> Self {
        Self::from_config(source, tokens, &SyncConfig::default())
    }

    /// Paginator using the retry budget and page delay from `config`
    pub fn from_config(
        source: Arc<dyn PageSource<T>>,
        tokens: TokenSource,
        config: &SyncConfig,
    ) -> Self {
        Self {
            source,
            tokens,
            retry: remote_retry(config),
            page_delay: config.page_delay(),
            cancel: None,
        }
    }

    pub fn with_retry(mut self, retry: RemoteRetry) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    /// Stop before the next request once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Delay inserted before following a cursor
    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    /// Fetch a single page through the retry executor
    ///
    /// The token source is resolved for every attempt.
    pub async fn fetch_page(&self, path: &str) -> Result<Page<T>> {
        self.retry
            .execute(move || async move {
                let token = self.tokens.resolve().await?;
                self.source.fetch_page(path, &token).await
            })
            .await
    }

    /// Collect every item of the listing in page-arrival order
    pub async fn fetch_all(&self, path: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        self.fetch_each(path, |page| {
            items.extend(page);
            async { Ok(()) }
        })
        .await?;
        Ok(items)
    }

    /// Hand each page's items to `on_page` as soon as it arrives
    ///
    /// Returns the number of items delivered. An error from `on_page` stops
    /// pagination and is returned as is.
    #[instrument(skip(self, on_page))]
    pub async fn fetch_each<F, Fut>(&self, path: &str, mut on_page: F) -> Result<usize>
    where
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut next = Some(path.to_string());
        let mut page_index = 0usize;
        let mut delivered = 0usize;

        while let Some(current) = next.take() {
            self.ensure_active()?;

            let Page { items, next_cursor } = self.fetch_page(&current).await?;
            debug!(
                page = page_index,
                items = items.len(),
                has_more = next_cursor.is_some(),
                "fetched page"
            );

            delivered += items.len();
            on_page(items).await?;

            if next_cursor.is_some() && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }

            next = next_cursor;
            page_index += 1;
        }

        debug!(pages = page_index, items = delivered, "listing exhausted");
        Ok(delivered)
    }

    fn ensure_active(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(TideSyncError::Cancelled),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Serves canned answers per path, recording every request.
    #[derive(Default)]
    struct ScriptedSource {
        answers: Mutex<HashMap<String, Vec<Result<Page<u32>>>>>,
        requests: Mutex<Vec<(String, String)>>,
    }

    impl ScriptedSource {
        fn answer(self, path: &str, result: Result<Page<u32>>) -> Self {
            self.answers.lock().unwrap().entry(path.to_string()).or_default().push(result);
            self
        }

        fn requests(&self) -> Vec<(String, String)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource<u32> for ScriptedSource {
        async fn fetch_page(&self, path: &str, token: &str) -> Result<Page<u32>> {
            self.requests.lock().unwrap().push((path.to_string(), token.to_string()));
            let mut answers = self.answers.lock().unwrap();
            match answers.get_mut(path) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => Err(TideSyncError::Remote { status: 404, message: path.to_string() }),
            }
        }
    }

    fn fast_config() -> SyncConfig {
        SyncConfig { page_delay_ms: 0, base_backoff_ms: 0, ..SyncConfig::default() }
    }

    #[tokio::test]
    async fn single_page_without_cursor() {
        let source = Arc::new(ScriptedSource::default().answer("/a", Ok(Page::last(vec![1]))));
        let paginator = Paginator::from_config(source.clone(), "t".into(), &fast_config());

        assert_eq!(paginator.fetch_all("/a").await.unwrap(), vec![1]);
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn token_is_resolved_for_every_page() {
        let source = Arc::new(
            ScriptedSource::default()
                .answer("/a", Ok(Page::new(vec![1], Some("c2".into()))))
                .answer("c2", Ok(Page::last(vec![2]))),
        );
        let counter = Arc::new(Mutex::new(0));
        let tokens = {
            let counter = Arc::clone(&counter);
            TokenSource::from_fn(move || {
                let mut n = counter.lock().unwrap();
                *n += 1;
                let token = format!("tok-{}", *n);
                async move { Ok(token) }
            })
        };

        let paginator = Paginator::from_config(source.clone(), tokens, &fast_config());
        paginator.fetch_all("/a").await.unwrap();

        assert_eq!(
            source.requests(),
            vec![("/a".to_string(), "tok-1".to_string()), ("c2".to_string(), "tok-2".to_string())]
        );
    }

    #[tokio::test]
    async fn transient_page_failure_is_retried_in_place() {
        let source = Arc::new(
            ScriptedSource::default()
                .answer("/a", Ok(Page::new(vec![1], Some("c2".into()))))
                .answer("c2", Err(TideSyncError::Remote { status: 502, message: "bad".into() }))
                .answer("c2", Ok(Page::last(vec![2]))),
        );
        let paginator = Paginator::from_config(source.clone(), "t".into(), &fast_config());

        assert_eq!(paginator.fetch_all("/a").await.unwrap(), vec![1, 2]);
        let paths: Vec<String> = source.requests().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["/a", "c2", "c2"]);
    }

    #[tokio::test]
    async fn on_page_error_stops_pagination() {
        let source = Arc::new(
            ScriptedSource::default()
                .answer("/a", Ok(Page::new(vec![1], Some("c2".into()))))
                .answer("c2", Ok(Page::last(vec![2]))),
        );
        let paginator = Paginator::from_config(source.clone(), "t".into(), &fast_config());

        let result = paginator
            .fetch_each("/a", |_| async { Err(TideSyncError::Database("disk full".into())) })
            .await;

        assert_eq!(result, Err(TideSyncError::Database("disk full".into())));
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn cancelled_paginator_issues_no_requests() {
        let source = Arc::new(ScriptedSource::default().answer("/a", Ok(Page::last(vec![1]))));
        let token = CancellationToken::new();
        token.cancel();
        let paginator = Paginator::from_config(source.clone(), "t".into(), &fast_config())
            .with_cancellation(token);

        assert_eq!(paginator.fetch_all("/a").await, Err(TideSyncError::Cancelled));
        assert!(source.requests().is_empty());
    }
}
