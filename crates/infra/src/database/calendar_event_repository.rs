//! SQLite implementation of the `EventReconciler` port.
//!
//! An event and its attendee set are written in one transaction. The parent
//! row is upserted on `(owner_id, remote_id)` and keeps its local id across
//! updates; when the listing carried attendees, the stored set is deleted and
//! reinserted. Any failure rolls the whole event back.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tidesync_common::storage::Transaction;
use tidesync_core::EventReconciler;
use tidesync_domain::{Attendee, AttendeeResponse, CalendarEvent, CalendarEventRow, Result};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::manager::DbManager;
use crate::errors::InfraError;

const UPSERT_EVENT_SQL: &str = "INSERT INTO calendar_events (
        id, owner_id, remote_id, summary, description,
        start_ts, end_ts, is_all_day, location, organizer_email,
        created_at, updated_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
    ON CONFLICT(owner_id, remote_id) DO UPDATE SET
        summary = excluded.summary,
        description = excluded.description,
        start_ts = excluded.start_ts,
        end_ts = excluded.end_ts,
        is_all_day = excluded.is_all_day,
        location = excluded.location,
        organizer_email = excluded.organizer_email,
        updated_at = excluded.updated_at
    RETURNING id";

const INSERT_ATTENDEE_SQL: &str = "INSERT INTO event_attendees
        (event_id, email, display_name, response, optional, position)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

/// SQLite reconciler for calendar events and their attendees
#[derive(Debug, Clone)]
pub struct SqliteEventReconciler {
    db: DbManager,
}

impl SqliteEventReconciler {
    pub fn new(db: DbManager) -> Self {
        Self { db }
    }

    /// Stored event for `(owner_id, remote_id)`
    #[instrument(skip(self))]
    pub async fn find_event(
        &self,
        owner_id: &str,
        remote_id: &str,
    ) -> Result<Option<CalendarEventRow>> {
        let (owner_id, remote_id) = (owner_id.to_string(), remote_id.to_string());
        self.db
            .run_blocking(move |db| {
                let conn = db.get_connection()?;
                let row = conn
                    .query_row(
                        "SELECT id, owner_id, remote_id, summary, description, start_ts, end_ts,
                                is_all_day, location, organizer_email, updated_at
                         FROM calendar_events
                         WHERE owner_id = ?1 AND remote_id = ?2",
                        params![owner_id, remote_id],
                        map_event_row,
                    )
                    .optional()
                    .map_err(InfraError::from)?;
                Ok(row)
            })
            .await
    }

    /// Attendees of a stored event, in listing order
    #[instrument(skip(self))]
    pub async fn attendees_for(&self, event_id: &str) -> Result<Vec<Attendee>> {
        let event_id = event_id.to_string();
        self.db
            .run_blocking(move |db| {
                let conn = db.get_connection()?;
                let mut stmt = conn
                    .prepare(
                        "SELECT email, display_name, response, optional
                         FROM event_attendees
                         WHERE event_id = ?1
                         ORDER BY position",
                    )
                    .map_err(InfraError::from)?;
                let attendees = stmt
                    .query_map(params![event_id], map_attendee_row)
                    .map_err(InfraError::from)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(InfraError::from)?;
                Ok(attendees)
            })
            .await
    }
}

#[async_trait]
impl EventReconciler for SqliteEventReconciler {
    #[instrument(skip(self, event), fields(remote_id = %event.remote_id))]
    async fn upsert(&self, event: &CalendarEvent, owner_id: &str) -> Result<String> {
        let event = event.clone();
        let owner_id = owner_id.to_string();

        let id = self
            .db
            .run_blocking(move |db| db.transaction(|tx| reconcile(tx, &event, &owner_id)))
            .await?;

        debug!(%id, "reconciled calendar event");
        Ok(id)
    }
}

fn reconcile(tx: &Transaction<'_>, event: &CalendarEvent, owner_id: &str) -> Result<String> {
    let now = Utc::now().timestamp();

    let id: String = tx
        .query_row(
            UPSERT_EVENT_SQL,
            params![
                Uuid::now_v7().to_string(),
                owner_id,
                event.remote_id,
                event.summary,
                event.description,
                event.start.timestamp(),
                event.end.timestamp(),
                event.is_all_day,
                event.location,
                event.organizer_email,
                now,
            ],
            |row| row.get(0),
        )
        .map_err(InfraError::from)?;

    if let Some(attendees) = &event.attendees {
        tx.execute("DELETE FROM event_attendees WHERE event_id = ?1", params![id])
            .map_err(InfraError::from)?;

        let mut insert = tx.prepare_cached(INSERT_ATTENDEE_SQL).map_err(InfraError::from)?;
        for (position, attendee) in attendees.iter().enumerate() {
            insert
                .execute(params![
                    id,
                    attendee.email,
                    attendee.display_name,
                    attendee.response.to_string(),
                    attendee.optional,
                    position as i64,
                ])
                .map_err(InfraError::from)?;
        }

        debug!(%id, attendees = attendees.len(), "replaced attendee set");
    }

    Ok(id)
}

fn map_event_row(row: &Row<'_>) -> rusqlite::Result<CalendarEventRow> {
    Ok(CalendarEventRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        remote_id: row.get(2)?,
        summary: row.get(3)?,
        description: row.get(4)?,
        start_ts: row.get(5)?,
        end_ts: row.get(6)?,
        is_all_day: row.get(7)?,
        location: row.get(8)?,
        organizer_email: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn map_attendee_row(row: &Row<'_>) -> rusqlite::Result<Attendee> {
    let response: String = row.get(2)?;
    let response = response
        .parse::<AttendeeResponse>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;

    Ok(Attendee {
        email: row.get(0)?,
        display_name: row.get(1)?,
        response,
        optional: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    use super::*;

    fn setup_test_db() -> (SqliteEventReconciler, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = DbManager::new(temp_dir.path().join("test.db"), 2).unwrap();
        db.run_migrations().unwrap();
        (SqliteEventReconciler::new(db), temp_dir)
    }

    fn event(remote_id: &str, attendees: Option<Vec<Attendee>>) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        CalendarEvent {
            remote_id: remote_id.to_string(),
            summary: Some("Planning".to_string()),
            description: None,
            start,
            end: start + chrono::Duration::hours(1),
            is_all_day: false,
            location: Some("Room 4".to_string()),
            organizer_email: Some("lead@example.com".to_string()),
            attendees,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_event() {
        let (repo, _temp) = setup_test_db();

        let id = repo.upsert(&event("evt-1", None), "owner-1").await.unwrap();

        let row = repo.find_event("owner-1", "evt-1").await.unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.summary.as_deref(), Some("Planning"));
        assert_eq!(row.end_ts - row.start_ts, 3600);
        assert!(repo.find_event("owner-2", "evt-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_keeps_local_id() {
        let (repo, _temp) = setup_test_db();

        let first = repo.upsert(&event("evt-1", None), "owner-1").await.unwrap();
        let mut changed = event("evt-1", None);
        changed.summary = Some("Planning (moved)".to_string());
        let second = repo.upsert(&changed, "owner-1").await.unwrap();

        assert_eq!(first, second);
        let row = repo.find_event("owner-1", "evt-1").await.unwrap().unwrap();
        assert_eq!(row.summary.as_deref(), Some("Planning (moved)"));
    }

    #[tokio::test]
    async fn test_attendee_set_is_replaced_in_order() {
        let (repo, _temp) = setup_test_db();

        let id = repo
            .upsert(
                &event("evt-1", Some(vec![Attendee::new("a@example.com"), Attendee::new("b@example.com")])),
                "owner-1",
            )
            .await
            .unwrap();

        let mut accepted = Attendee::new("c@example.com");
        accepted.response = AttendeeResponse::Accepted;
        repo.upsert(&event("evt-1", Some(vec![accepted.clone()])), "owner-1").await.unwrap();

        assert_eq!(repo.attendees_for(&id).await.unwrap(), vec![accepted]);
    }

    #[tokio::test]
    async fn test_missing_attendees_leave_stored_set_untouched() {
        let (repo, _temp) = setup_test_db();

        let id = repo
            .upsert(&event("evt-1", Some(vec![Attendee::new("a@example.com")])), "owner-1")
            .await
            .unwrap();
        repo.upsert(&event("evt-1", None), "owner-1").await.unwrap();
        assert_eq!(repo.attendees_for(&id).await.unwrap().len(), 1);

        repo.upsert(&event("evt-1", Some(vec![])), "owner-1").await.unwrap();
        assert!(repo.attendees_for(&id).await.unwrap().is_empty());
    }
}
