//! # TideSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The HTTP page source for the remote collection service
//! - SQLite implementations of the reconciler and leaf store
//! - Configuration loading and tracing setup
//! - The sync context that wires a loaded configuration into an orchestrator
//! - A deduplicating credential refresher
//!
//! ## Architecture
//! - Implements traits defined in `tidesync-core`
//! - Depends on `tidesync-common` (platform tier) and `tidesync-domain`
//! - Contains all "impure" code (network, disk)

pub mod auth;
pub mod config;
pub mod context;
pub mod database;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use auth::{Credential, CredentialRefresher, SharedRefreshProvider};
pub use context::SyncContext;
pub use database::{DbManager, SqliteEventReconciler, SqliteLeafStore};
pub use errors::InfraError;
pub use http::{HttpClient, HttpPageSource};
pub use observability::{init_tracing, LogFormat};
