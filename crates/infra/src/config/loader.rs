//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `TIDESYNC_DB_PATH`: Database file path
//! - `TIDESYNC_REMOTE_BASE_URL`: Base URL of the remote collection service
//!
//! Optional (defaults from `tidesync_domain::constants`):
//! - `TIDESYNC_DB_POOL_SIZE`: Connection pool size
//! - `TIDESYNC_REMOTE_TIMEOUT_SECS`: Per-request timeout
//! - `TIDESYNC_REMOTE_CHILDREN_PATH`: Container listing template (`{id}`)
//! - `TIDESYNC_SYNC_CONCURRENCY`: Owners scanned at the same time
//! - `TIDESYNC_SYNC_PAGE_DELAY_MS`: Delay between two pages of a listing
//! - `TIDESYNC_SYNC_MAX_RETRIES`: Retries per page request
//! - `TIDESYNC_SYNC_BASE_BACKOFF_MS`: Exponential backoff unit
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./tidesync.json` or `./tidesync.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tidesync_domain::constants::{
    DEFAULT_BASE_BACKOFF_MS, DEFAULT_CHILDREN_PATH, DEFAULT_CONCURRENCY, DEFAULT_DB_POOL_SIZE,
    DEFAULT_MAX_RETRIES, DEFAULT_PAGE_DELAY_MS, DEFAULT_REMOTE_TIMEOUT_SECS,
};
use tidesync_domain::{Config, DatabaseConfig, RemoteConfig, Result, SyncConfig, TideSyncError};

const CONFIG_FILE_NAMES: [&str; 4] = ["tidesync.json", "tidesync.toml", "config.json", "config.toml"];

const REQUIRED_ENV_VARS: [&str; 2] = ["TIDESYNC_DB_PATH", "TIDESYNC_REMOTE_BASE_URL"];

/// Load configuration with automatic fallback strategy
///
/// Uses environment variables when every required variable is set. If any
/// required variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `TideSyncError::Config` if:
/// - The required variables are set but an optional one is unparsable
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    let missing: Vec<&str> =
        REQUIRED_ENV_VARS.into_iter().filter(|key| std::env::var_os(key).is_none()).collect();

    if missing.is_empty() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(config);
    }

    tracing::debug!(?missing, "Environment incomplete, trying file");
    load_from_file(None)
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `TideSyncError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("TIDESYNC_DB_PATH")?;
    let base_url = env_var("TIDESYNC_REMOTE_BASE_URL")?;

    Ok(Config {
        database: DatabaseConfig {
            path: db_path,
            pool_size: env_parse("TIDESYNC_DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE)?,
        },
        remote: RemoteConfig {
            base_url,
            timeout_secs: env_parse("TIDESYNC_REMOTE_TIMEOUT_SECS", DEFAULT_REMOTE_TIMEOUT_SECS)?,
            children_path: std::env::var("TIDESYNC_REMOTE_CHILDREN_PATH")
                .unwrap_or_else(|_| DEFAULT_CHILDREN_PATH.to_string()),
        },
        sync: SyncConfig {
            concurrency: env_parse("TIDESYNC_SYNC_CONCURRENCY", DEFAULT_CONCURRENCY)?,
            page_delay_ms: env_parse("TIDESYNC_SYNC_PAGE_DELAY_MS", DEFAULT_PAGE_DELAY_MS)?,
            max_retries: env_parse("TIDESYNC_SYNC_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            base_backoff_ms: env_parse("TIDESYNC_SYNC_BASE_BACKOFF_MS", DEFAULT_BASE_BACKOFF_MS)?,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `TideSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(TideSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            TideSyncError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| TideSyncError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| TideSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| TideSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(TideSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Returns the first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        TideSyncError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable, falling back to `default`
///
/// # Errors
/// Returns `TideSyncError::Config` if the variable is set but unparsable.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| TideSyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}
