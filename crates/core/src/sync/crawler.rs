//! Depth-first crawl of a container/leaf hierarchy
//!
//! The walk keeps an explicit stack with one frame per open container. A frame
//! holds the unconsumed items of the container's current page and the cursor
//! to its next page, so memory stays at one page per open level and deep
//! hierarchies cannot exhaust the call stack. Containers are crawled to
//! completion before their remaining siblings (pre-order), and each container's
//! cursor chain is followed strictly in sequence.

use std::collections::VecDeque;
use std::sync::Arc;

use tidesync_domain::constants::DEFAULT_CHILDREN_PATH;
use tidesync_domain::{CrawlTotals, NodeKind, RemoteConfig, ResourceNode, Result, TideSyncError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::pagination::Paginator;
use super::ports::LeafStore;

/// Builds the listing path for a container's children
pub trait ListingPaths: Send + Sync {
    fn children_path(&self, container_id: &str) -> String;
}

/// Path template where `{id}` is replaced with the container id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplatePaths {
    template: String,
}

impl TemplatePaths {
    pub fn new(template: impl Into<String>) -> Self {
        Self { template: template.into() }
    }
}

impl Default for TemplatePaths {
    fn default() -> Self {
        Self::new(DEFAULT_CHILDREN_PATH)
    }
}

impl From<&RemoteConfig> for TemplatePaths {
    fn from(config: &RemoteConfig) -> Self {
        Self::new(config.children_path.clone())
    }
}

impl ListingPaths for TemplatePaths {
    fn children_path(&self, container_id: &str) -> String {
        self.template.replace("{id}", container_id)
    }
}

/// One open container on the crawl stack
struct Frame {
    container_id: String,
    pending: VecDeque<ResourceNode>,
    next_cursor: Option<String>,
}

/// Walks a hierarchy, persisting leaves as they are discovered
pub struct TreeCrawler {
    listing: Paginator<ResourceNode>,
    store: Arc<dyn LeafStore>,
    paths: Arc<dyn ListingPaths>,
    cancel: Option<CancellationToken>,
}

impl TreeCrawler {
    pub fn new(listing: Paginator<ResourceNode>, store: Arc<dyn LeafStore>) -> Self {
        Self { listing, store, paths: Arc::new(TemplatePaths::default()), cancel: None }
    }

    pub fn with_paths(mut self, paths: Arc<dyn ListingPaths>) -> Self {
        self.paths = paths;
        self
    }

    /// Stop between children once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Crawl everything below `root_id` for `owner_id`
    ///
    /// Leaf persistence failures are counted and the walk continues. A
    /// container (the root included) that is missing or forbidden counts as an
    /// empty subtree. Any other listing failure is returned.
    #[instrument(skip(self))]
    pub async fn crawl(&self, owner_id: &str, root_id: &str) -> Result<CrawlTotals> {
        let mut totals = CrawlTotals::default();

        let root = match self.open(root_id).await {
            Ok(frame) => frame,
            Err(err) if err.is_absent() => {
                info!(error = %err, "root not available, nothing to crawl");
                return Ok(totals);
            }
            Err(err) => return Err(err),
        };

        let mut stack = vec![root];
        while let Some(frame) = stack.last_mut() {
            self.ensure_active()?;

            if let Some(mut node) = frame.pending.pop_front() {
                if node.parent_id.is_none() {
                    node.parent_id = Some(frame.container_id.clone());
                }

                match node.kind {
                    NodeKind::Leaf => match self.store.persist_leaf(owner_id, &node).await {
                        Ok(()) => totals.record_success(),
                        Err(err) => {
                            warn!(leaf_id = %node.id, error = %err, "failed to persist leaf");
                            totals.record_failure();
                        }
                    },
                    NodeKind::Container => match self.open(&node.id).await {
                        Ok(child) => stack.push(child),
                        Err(err) if err.is_absent() => {
                            info!(container_id = %node.id, error = %err, "container gone, skipping");
                        }
                        Err(err) => return Err(err),
                    },
                }
            } else if let Some(cursor) = frame.next_cursor.take() {
                let delay = self.listing.page_delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let page = self.listing.fetch_page(&cursor).await?;
                frame.pending = page.items.into();
                frame.next_cursor = page.next_cursor;
            } else {
                debug!(container_id = %frame.container_id, "container exhausted");
                stack.pop();
            }
        }

        info!(processed = totals.processed, failed = totals.failed, "crawl complete");
        Ok(totals)
    }

    /// List the first page of a container
    async fn open(&self, container_id: &str) -> Result<Frame> {
        self.ensure_active()?;
        let path = self.paths.children_path(container_id);
        let page = self.listing.fetch_page(&path).await?;
        debug!(container_id, items = page.items.len(), "opened container");

        Ok(Frame {
            container_id: container_id.to_string(),
            pending: page.items.into(),
            next_cursor: page.next_cursor,
        })
    }

    fn ensure_active(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(TideSyncError::Cancelled),
            _ => Ok(()),
        }
    }
}
