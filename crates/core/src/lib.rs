//! # TideSync Core
//!
//! Pure sync logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the remote collection and local storage
//! - The paginated fetcher, remote retry policy and tree crawler
//! - The sync orchestrator that fans owners out through the dispatcher
//!
//! ## Architecture Principles
//! - Only depends on `tidesync-common` and `tidesync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod auth;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use auth::{TokenProvider, TokenSource};
pub use sync::crawler::{ListingPaths, TemplatePaths, TreeCrawler};
pub use sync::orchestrator::{HierarchyScanReport, HierarchyTarget, SyncOrchestrator};
pub use sync::pagination::Paginator;
pub use sync::ports::{EventReconciler, LeafStore, PageSource};
pub use sync::retry::{remote_retry, RemoteRetry, RemoteRetryPolicy};
