//! Configuration structures
//!
//! Loaded by `tidesync_infra::config` from environment variables or files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_BACKOFF_MS, DEFAULT_CHILDREN_PATH, DEFAULT_CONCURRENCY, DEFAULT_DB_POOL_SIZE,
    DEFAULT_MAX_RETRIES, DEFAULT_PAGE_DELAY_MS, DEFAULT_REMOTE_TIMEOUT_SECS,
};

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Local SQLite store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// Remote collection service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Listing path template for hierarchy containers (`{id}` placeholder).
    #[serde(default = "default_children_path")]
    pub children_path: String,
}

/// Concurrency, pacing and retry budget of the sync engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum number of owners scanned at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Delay inserted between two pages of the same listing.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    /// Retries after the first attempt of a single page request.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Unit of the exponential backoff (`base * 2^retries`).
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
}

impl SyncConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            page_delay_ms: DEFAULT_PAGE_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}

fn default_children_path() -> String {
    DEFAULT_CHILDREN_PATH.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_page_delay_ms() -> u64 {
    DEFAULT_PAGE_DELAY_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_backoff_ms() -> u64 {
    DEFAULT_BASE_BACKOFF_MS
}
