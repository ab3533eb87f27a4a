//! Shared helpers for `tidesync-infra` integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use tidesync_domain::{Attendee, CalendarEvent, SyncConfig};
use tidesync_infra::database::DbManager;
use tidesync_infra::LogFormat;

/// Install the crate's subscriber once per test binary; `RUST_LOG` overrides.
pub fn init_tracing() {
    let _ = tidesync_infra::init_tracing("warn", LogFormat::Pretty);
}

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: DbManager,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the full schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema should be created");

        Self { manager, _temp_dir: temp_dir }
    }

    /// Execute a batch of SQL statements against the database.
    pub fn execute_batch(&self, sql: &str) {
        let conn = self
            .manager
            .get_connection()
            .expect("connection should be available for execute_batch");
        conn.execute_batch(sql).expect("SQL batch execution should succeed");
    }

    pub fn count(&self, sql: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(sql, [], |row| row.get(0)).expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Sync settings without page delay and with millisecond backoff.
pub fn fast_sync_config() -> SyncConfig {
    SyncConfig { concurrency: 2, page_delay_ms: 0, max_retries: 3, base_backoff_ms: 1 }
}

pub fn event(remote_id: &str, attendees: Option<&[&str]>) -> CalendarEvent {
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    CalendarEvent {
        remote_id: remote_id.to_string(),
        summary: Some(format!("Meeting {remote_id}")),
        description: None,
        start,
        end: start + chrono::Duration::minutes(30),
        is_all_day: false,
        location: None,
        organizer_email: None,
        attendees: attendees.map(|emails| emails.iter().map(|e| Attendee::new(*e)).collect()),
    }
}
