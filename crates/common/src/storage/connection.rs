//! Pooled SQLite connection wrapper

use std::ops::{Deref, DerefMut};

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection as RusqliteConnection, TransactionBehavior};
use tracing::{debug, instrument};

use super::error::{StorageError, StorageResult};
use super::types::Transaction;

/// Pooled connection
///
/// The connection is returned to the pool when dropped.
pub struct SqliteConnection {
    inner: PooledConnection<SqliteConnectionManager>,
}

impl SqliteConnection {
    /// Create a new connection wrapper from a pooled connection
    pub fn new(conn: PooledConnection<SqliteConnectionManager>) -> Self {
        Self { inner: conn }
    }

    /// Begin an immediate (write-locking) transaction
    #[instrument(skip(self))]
    pub fn transaction(&mut self) -> StorageResult<Transaction<'_>> {
        let tx = self
            .inner
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StorageError::from)?;

        Ok(Transaction::new(tx))
    }

    /// Run `f` inside a transaction
    ///
    /// Commits when `f` returns `Ok`. Any error from `f` or from the commit
    /// itself leaves the database as it was before the call.
    pub fn with_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    {
        let tx = self.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!("transaction body failed, rolling back");
                drop(tx);
                Err(err)
            }
        }
    }
}

impl Deref for SqliteConnection {
    type Target = RusqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for SqliteConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
