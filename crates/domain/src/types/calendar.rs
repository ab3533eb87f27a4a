//! Calendar events and their attendee collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Event as listed by the remote calendar service.
///
/// `attendees` is the dependent child collection. `None` means the listing
/// did not include attendees and the stored set must be left untouched;
/// `Some(vec![])` replaces the stored set with nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    #[serde(rename = "id")]
    pub remote_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub organizer_email: Option<String>,
    #[serde(default)]
    pub attendees: Option<Vec<Attendee>>,
}

/// One attendee of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub response: AttendeeResponse,
    #[serde(default)]
    pub optional: bool,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            response: AttendeeResponse::default(),
            optional: false,
        }
    }
}

/// RSVP state of an attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeResponse {
    #[default]
    #[serde(alias = "none", alias = "notResponded")]
    NeedsAction,
    Accepted,
    #[serde(alias = "tentativelyAccepted")]
    Tentative,
    Declined,
}

impl_domain_status_conversions!(AttendeeResponse {
    NeedsAction => "needs_action",
    Accepted => "accepted",
    Tentative => "tentative",
    Declined => "declined",
});

/// Row of the `calendar_events` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventRow {
    pub id: String,
    pub owner_id: String,
    pub remote_id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start_ts: i64,
    pub end_ts: i64,
    pub is_all_day: bool,
    pub location: Option<String>,
    pub organizer_email: Option<String>,
    pub updated_at: i64,
}
