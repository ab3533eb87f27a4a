//! Core storage types

use std::ops::Deref;

use rusqlite::{DropBehavior, Transaction as RusqliteTransaction};

use super::error::{StorageError, StorageResult};

/// Transaction wrapper
///
/// Transactions roll back on drop unless committed.
pub struct Transaction<'conn> {
    inner: RusqliteTransaction<'conn>,
}

impl<'conn> Transaction<'conn> {
    /// Create a new transaction wrapper
    pub fn new(mut transaction: RusqliteTransaction<'conn>) -> Self {
        transaction.set_drop_behavior(DropBehavior::Rollback);
        Self { inner: transaction }
    }

    /// Commit the transaction
    pub fn commit(self) -> StorageResult<()> {
        self.inner.commit().map_err(StorageError::from)
    }
}

impl<'conn> Deref for Transaction<'conn> {
    type Target = RusqliteTransaction<'conn>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Health status of the storage system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub healthy: bool,

    /// Number of open connections
    pub active_connections: usize,

    /// Number of idle connections
    pub idle_connections: usize,

    /// Maximum pool size
    pub max_connections: usize,

    /// Optional error message if unhealthy
    pub message: Option<String>,
}

impl HealthStatus {
    /// Create a healthy status
    pub fn healthy(active: usize, idle: usize, max: usize) -> Self {
        Self {
            healthy: true,
            active_connections: active,
            idle_connections: idle,
            max_connections: max,
            message: None,
        }
    }

    /// Create an unhealthy status
    pub fn unhealthy(message: String) -> Self {
        Self {
            healthy: false,
            active_connections: 0,
            idle_connections: 0,
            max_connections: 0,
            message: Some(message),
        }
    }
}
