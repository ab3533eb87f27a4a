//! SQLite connection pool
//!
//! Provides r2d2-based connection pooling with pragmas applied to every
//! connection as it is opened.

use std::time::Instant;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{debug, info, instrument, warn};

use super::config::StorageConfig;
use super::connection::SqliteConnection;
use super::error::{StorageError, StorageResult};
use super::pragmas::apply_connection_pragmas;
use super::types::HealthStatus;

/// SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqlitePool {
    pool: Pool<SqliteConnectionManager>,
    config: StorageConfig,
}

impl SqlitePool {
    /// Open (or create) the database at `config.path` and build the pool
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, the parent directory
    /// cannot be created, or the first connection cannot be opened.
    #[instrument(fields(db_path = ?config.path, pool_size = config.pool_size))]
    pub fn new(config: StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        info!("Creating SQLite connection pool");

        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let pragma_config = config.clone();
        let manager = SqliteConnectionManager::file(&config.path).with_init(move |conn| {
            apply_connection_pragmas(conn, &pragma_config)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        });

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .map_err(|e| {
                warn!("Failed to create connection pool: {}", e);
                StorageError::Connection(format!("Failed to create pool: {e}"))
            })?;

        info!("SQLite pool created with {} connections", config.pool_size);
        Ok(Self { pool, config })
    }

    /// Borrow a connection from the pool
    ///
    /// Blocks up to the configured connection timeout.
    #[instrument(skip(self), fields(pool_size = self.config.pool_size))]
    pub fn get(&self) -> StorageResult<SqliteConnection> {
        let start = Instant::now();
        match self.pool.get() {
            Ok(conn) => {
                debug!(elapsed_ms = start.elapsed().as_millis() as u64, "connection acquired");
                Ok(SqliteConnection::new(conn))
            }
            Err(e) if e.to_string().to_lowercase().contains("timed out") => {
                warn!("Connection timeout after {:?}", self.config.connection_timeout);
                Err(StorageError::Timeout(self.config.connection_timeout.as_secs()))
            }
            Err(e) => {
                warn!("Connection error: {}", e);
                Err(StorageError::Connection(format!("Failed to get connection: {e}")))
            }
        }
    }

    /// Report pool state
    pub fn health_check(&self) -> HealthStatus {
        let state = self.pool.state();
        match self.pool.get() {
            Ok(_conn) => HealthStatus::healthy(
                state.connections as usize,
                state.idle_connections as usize,
                self.config.pool_size as usize,
            ),
            Err(e) => HealthStatus::unhealthy(format!("Pool unhealthy: {e}")),
        }
    }
}
