//! Modular common utilities shared across TideSync crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `runtime`: async building blocks (retry executor, concurrency dispatcher)
//! - `platform`: local storage (SQLite pool, connections, transactions)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod concurrency;
#[cfg(feature = "runtime")]
pub mod resilience;

// Platform tier
// -------------------------------------------------------------------
#[cfg(feature = "platform")]
pub mod storage;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use concurrency::{run_concurrent, run_concurrent_cancellable, DispatchOptions, Outcome};
#[cfg(feature = "runtime")]
pub use resilience::{RetryConfig, RetryDecision, RetryExecutor, RetryPolicy};
#[cfg(feature = "platform")]
pub use storage::{SqliteConnection, SqlitePool, StorageConfig, StorageError, StorageResult};
