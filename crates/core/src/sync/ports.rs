//! Port interfaces for sync operations

use async_trait::async_trait;
use tidesync_domain::{CalendarEvent, Page, ResourceNode, Result};

/// Trait for fetching one page of a remote listing
#[async_trait]
pub trait PageSource<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Fetch the page at `path` (a relative path or a cursor) using `token`
    async fn fetch_page(&self, path: &str, token: &str) -> Result<Page<T>>;
}

/// Trait for persisting leaf nodes discovered by a crawl
#[async_trait]
pub trait LeafStore: Send + Sync {
    /// Insert or update a leaf for an owner
    async fn persist_leaf(&self, owner_id: &str, leaf: &ResourceNode) -> Result<()>;
}

/// Trait for reconciling calendar events with their attendees
#[async_trait]
pub trait EventReconciler: Send + Sync {
    /// Upsert the event and, when attendees are supplied, replace them
    ///
    /// Returns the local row id, which stays stable across updates.
    async fn upsert(&self, event: &CalendarEvent, owner_id: &str) -> Result<String>;
}
