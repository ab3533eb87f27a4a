//! Sync orchestration across owners
//!
//! The orchestrator fans owners out through the bounded dispatcher. Each owner
//! runs in isolation: a failing owner shows up as an error outcome and never
//! stops the batch.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tidesync_common::concurrency::{
    run_concurrent, run_concurrent_cancellable, summarize, DispatchOptions, DispatchSummary,
    Outcome,
};
use tidesync_domain::{CalendarEvent, CrawlTotals, Result, SyncConfig, TideSyncError};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::crawler::TreeCrawler;
use super::pagination::Paginator;
use super::ports::EventReconciler;

/// One hierarchy to crawl
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HierarchyTarget {
    pub owner_id: String,
    pub root_id: String,
}

impl HierarchyTarget {
    pub fn new(owner_id: impl Into<String>, root_id: impl Into<String>) -> Self {
        Self { owner_id: owner_id.into(), root_id: root_id.into() }
    }
}

/// Result of crawling many hierarchies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyScanReport {
    /// One entry per target, in input order
    pub outcomes: Vec<Outcome<HierarchyTarget, CrawlTotals, TideSyncError>>,
    /// Sum of the totals of every crawl that completed
    pub totals: CrawlTotals,
}

impl HierarchyScanReport {
    /// Targets whose crawl completed versus failed outright
    pub fn summary(&self) -> DispatchSummary {
        summarize(&self.outcomes)
    }
}

/// Wires the dispatcher, crawler and event reconciler together
pub struct SyncOrchestrator {
    options: DispatchOptions,
    crawler: Option<Arc<TreeCrawler>>,
    events: Option<(Paginator<CalendarEvent>, Arc<dyn EventReconciler>)>,
    cancel: Option<CancellationToken>,
}

impl fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("options", &self.options)
            .field("crawler", &self.crawler.is_some())
            .field("events", &self.events.is_some())
            .finish_non_exhaustive()
    }
}

impl SyncOrchestrator {
    /// Orchestrator with the concurrency limit from `config`
    ///
    /// Progress is logged after every finished owner.
    pub fn new(config: &SyncConfig) -> Self {
        let options = DispatchOptions::new(config.concurrency).with_progress(|completed, total| {
            info!(completed, total, "owner finished");
        });
        Self { options, crawler: None, events: None, cancel: None }
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_crawler(mut self, crawler: TreeCrawler) -> Self {
        self.crawler = Some(Arc::new(crawler));
        self
    }

    pub fn with_events(
        mut self,
        listing: Paginator<CalendarEvent>,
        reconciler: Arc<dyn EventReconciler>,
    ) -> Self {
        self.events = Some((listing, reconciler));
        self
    }

    /// Owners not yet started when `token` fires are reported as cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run `task` once per item under the concurrency limit
    pub async fn scan_flat_collection<I, T, F, Fut>(
        &self,
        items: Vec<I>,
        task: F,
    ) -> Vec<Outcome<I, T, TideSyncError>>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match &self.cancel {
            Some(token) => {
                run_concurrent_cancellable(items, task, self.options.clone(), token, |_| {
                    TideSyncError::Cancelled
                })
                .await
            }
            None => run_concurrent(items, task, self.options.clone()).await,
        }
    }

    /// Crawl a single hierarchy
    pub async fn scan_hierarchy(&self, owner_id: &str, root_id: &str) -> Result<CrawlTotals> {
        self.crawler()?.crawl(owner_id, root_id).await
    }

    /// Crawl many hierarchies concurrently
    ///
    /// Totals of completed crawls are summed as they finish.
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub async fn scan_hierarchies(
        &self,
        targets: Vec<HierarchyTarget>,
    ) -> Result<HierarchyScanReport> {
        let crawler = self.crawler()?;
        let processed = AtomicU64::new(0);
        let failed = AtomicU64::new(0);

        let outcomes = self
            .scan_flat_collection(targets, |target| {
                let (processed, failed) = (&processed, &failed);
                async move {
                    let totals = crawler.crawl(&target.owner_id, &target.root_id).await?;
                    processed.fetch_add(totals.processed, Ordering::Relaxed);
                    failed.fetch_add(totals.failed, Ordering::Relaxed);
                    Ok(totals)
                }
            })
            .await;

        for outcome in outcomes.iter().filter(|o| o.is_failure()) {
            if let Err(err) = &outcome.result {
                warn!(owner_id = %outcome.item.owner_id, error = %err, "hierarchy scan failed");
            }
        }

        let totals = CrawlTotals::new(processed.into_inner(), failed.into_inner());
        info!(processed = totals.processed, failed = totals.failed, "hierarchy scan complete");
        Ok(HierarchyScanReport { outcomes, totals })
    }

    /// Stream an owner's events page by page through the reconciler
    ///
    /// A failed upsert is counted and the remaining events are still
    /// reconciled. Listing failures are returned.
    #[instrument(skip(self))]
    pub async fn sync_events(&self, owner_id: &str, path: &str) -> Result<CrawlTotals> {
        let (listing, reconciler) = self
            .events
            .as_ref()
            .ok_or_else(|| TideSyncError::Config("event sync is not configured".to_string()))?;

        let processed = AtomicU64::new(0);
        let failed = AtomicU64::new(0);

        listing
            .fetch_each(path, |events| {
                let (processed, failed) = (&processed, &failed);
                async move {
                    for event in events {
                        match reconciler.upsert(&event, owner_id).await {
                            Ok(_) => {
                                processed.fetch_add(1, Ordering::Relaxed);
                            }
                            Err(err) => {
                                warn!(
                                    remote_id = %event.remote_id,
                                    error = %err,
                                    "failed to reconcile event"
                                );
                                failed.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Ok(())
                }
            })
            .await?;

        let totals = CrawlTotals::new(processed.into_inner(), failed.into_inner());
        info!(processed = totals.processed, failed = totals.failed, "event sync complete");
        Ok(totals)
    }

    fn crawler(&self) -> Result<&TreeCrawler> {
        self.crawler
            .as_deref()
            .ok_or_else(|| TideSyncError::Config("hierarchy crawl is not configured".to_string()))
    }
}
