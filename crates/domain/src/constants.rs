//! Application constants
//!
//! Defaults shared by the configuration structs and the sync engine.

// Sync engine defaults
pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1000;

// Remote service defaults
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("tidesync/", env!("CARGO_PKG_VERSION"));

// Local storage defaults
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;

/// Listing path template for hierarchy containers; `{id}` is replaced.
pub const DEFAULT_CHILDREN_PATH: &str = "/items/{id}/children";
