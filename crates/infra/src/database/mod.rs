//! Database implementations

pub mod calendar_event_repository;
pub mod drive_item_repository;
pub mod manager;

pub use calendar_event_repository::SqliteEventReconciler;
pub use drive_item_repository::SqliteLeafStore;
pub use manager::DbManager;
