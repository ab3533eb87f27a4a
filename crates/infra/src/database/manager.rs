//! Database connection manager backed by the shared SQLite pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::params;
use tidesync_common::storage::{
    HealthStatus, SqliteConnection, SqlitePool, StorageConfig, Transaction,
};
use tidesync_domain::{DatabaseConfig, Result, TideSyncError};
use tokio::task;
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Database manager that wraps an [`SqlitePool`].
#[derive(Debug, Clone)]
pub struct DbManager {
    pool: Arc<SqlitePool>,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database at `db_path` with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let config = StorageConfig::new(&path).with_pool_size(pool_size.max(1));

        let pool = SqlitePool::new(config).map_err(InfraError::from)?;

        info!(db_path = %path.display(), max_connections = pool_size.max(1), "sqlite pool initialised");

        Ok(Self { pool: Arc::new(pool), path })
    }

    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        Self::new(&config.path, config.pool_size)
    }

    /// Borrow the underlying pool.
    pub fn pool(&self) -> &Arc<SqlitePool> {
        &self.pool
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        self.pool.get().map_err(|e| InfraError::from(e).into())
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Report pool state after verifying the database answers a trivial query.
    pub fn health_check(&self) -> Result<HealthStatus> {
        let status = self.pool.health_check();
        if !status.healthy {
            let message = status.message.unwrap_or_else(|| "pool unhealthy".to_string());
            return Err(TideSyncError::Database(message));
        }

        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(InfraError::from)?;
        Ok(status)
    }

    /// Run `f` inside one immediate transaction.
    ///
    /// Commits when `f` returns `Ok`; any error rolls everything back and is
    /// returned unchanged.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.get_connection()?;
        conn.with_transaction(|tx| f(tx).map_err(InfraError)).map_err(TideSyncError::from)
    }

    /// Run blocking database work on the blocking thread pool.
    pub async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&DbManager) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.clone();
        task::spawn_blocking(move || f(&db)).await.map_err(InfraError::from)?
    }
}

fn create_schema(conn: &SqliteConnection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL).map_err(InfraError::from)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )
    .map_err(InfraError::from)?;
    Ok(())
}
