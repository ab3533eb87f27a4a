//! Storage configuration
//!
//! Connection pool settings and the per-connection pragmas they drive.

use std::path::PathBuf;
use std::time::Duration;

use super::error::{StorageError, StorageResult};

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Database file path
    pub path: PathBuf,

    /// Connection pool size (default: 4)
    pub pool_size: u32,

    /// Connection timeout (default: 5s)
    pub connection_timeout: Duration,

    /// Busy timeout for lock contention (default: 5000ms)
    pub busy_timeout: Duration,

    /// Enable WAL mode (default: true)
    pub enable_wal: bool,

    /// Enable foreign keys (default: true)
    pub enable_foreign_keys: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/tidesync.db"),
            pool_size: 4,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

impl StorageConfig {
    /// Create a new configuration with the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Default::default() }
    }

    /// Override the pool size
    #[must_use]
    pub fn with_pool_size(mut self, pool_size: u32) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns an error if any configuration value is out of range.
    pub fn validate(&self) -> StorageResult<()> {
        if self.pool_size == 0 {
            return Err(StorageError::InvalidConfig(
                "pool_size must be greater than 0".to_string(),
            ));
        }

        if self.connection_timeout.is_zero() {
            return Err(StorageError::InvalidConfig(
                "connection_timeout must be greater than 0".to_string(),
            ));
        }

        if self.path.as_os_str().is_empty() {
            return Err(StorageError::InvalidConfig("path must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();

        assert_eq!(config.pool_size, 4);
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
        assert!(config.enable_wal);
        assert!(config.enable_foreign_keys);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = StorageConfig::new("test.db").with_pool_size(0);
        assert!(matches!(config.validate(), Err(StorageError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_path_rejected() {
        let config = StorageConfig::new("");
        assert!(matches!(config.validate(), Err(StorageError::InvalidConfig(_))));
    }
}
