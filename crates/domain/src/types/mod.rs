//! Domain types and models

pub mod calendar;
pub mod remote;
pub mod totals;

pub use calendar::{Attendee, AttendeeResponse, CalendarEvent, CalendarEventRow};
pub use remote::{NodeKind, Page, ResourceNode};
pub use totals::CrawlTotals;
