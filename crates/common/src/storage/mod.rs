//! Storage primitives for local SQLite databases
//!
//! Connection pooling, per-connection pragmas and a transaction helper that
//! commits or rolls back as a unit.

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;
pub mod pragmas;
pub mod types;

pub use config::StorageConfig;
pub use connection::SqliteConnection;
pub use error::{StorageError, StorageResult};
pub use pool::SqlitePool;
pub use pragmas::apply_connection_pragmas;
pub use types::{HealthStatus, Transaction};
