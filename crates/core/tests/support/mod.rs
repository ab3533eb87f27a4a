//! Shared test helpers for `tidesync-core` integration tests.
//!
//! In-memory fakes for the sync ports so the tests can focus on ordering,
//! isolation and totals instead of transport details.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tidesync_core::{EventReconciler, LeafStore, PageSource, Paginator, TokenSource};
use tidesync_domain::{CalendarEvent, Page, ResourceNode, Result, SyncConfig, TideSyncError};
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Sync settings with no waiting anywhere.
pub fn fast_config() -> SyncConfig {
    SyncConfig { concurrency: 2, page_delay_ms: 0, max_retries: 3, base_backoff_ms: 0 }
}

pub fn paginator<T>(remote: &Arc<FakeRemote<T>>) -> Paginator<T>
where
    T: Clone + Send + Sync + 'static,
{
    Paginator::from_config(remote.clone(), TokenSource::fixed("test-token"), &fast_config())
}

/// Remote collection keyed by request path.
///
/// Each path answers from a queue; the last answer repeats once the queue is
/// down to one entry.
pub struct FakeRemote<T> {
    routes: Mutex<HashMap<String, VecDeque<Result<Page<T>>>>>,
    requests: Mutex<Vec<String>>,
}

impl<T> Default for FakeRemote<T> {
    fn default() -> Self {
        Self { routes: Mutex::default(), requests: Mutex::default() }
    }
}

impl<T: Clone> FakeRemote<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, path: &str, items: Vec<T>, next_cursor: Option<&str>) -> Self {
        self.answer(path, Ok(Page::new(items, next_cursor.map(str::to_string))))
    }

    pub fn fail(self, path: &str, error: TideSyncError) -> Self {
        self.answer(path, Err(error))
    }

    pub fn answer(self, path: &str, result: Result<Page<T>>) -> Self {
        self.routes.lock().unwrap().entry(path.to_string()).or_default().push_back(result);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl<T> PageSource<T> for FakeRemote<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, path: &str, _token: &str) -> Result<Page<T>> {
        self.requests.lock().unwrap().push(path.to_string());
        let mut routes = self.routes.lock().unwrap();
        let Some(queue) = routes.get_mut(path) else {
            return Err(TideSyncError::Remote { status: 404, message: format!("no route {path}") });
        };
        let answer = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
        answer.unwrap()
    }
}

/// Records persisted leaves; fails for a configured set of ids.
#[derive(Default)]
pub struct RecordingLeafStore {
    persisted: Mutex<Vec<(String, ResourceNode)>>,
    failing: HashSet<String>,
}

impl RecordingLeafStore {
    pub fn failing_on(ids: &[&str]) -> Self {
        Self { failing: ids.iter().map(|id| (*id).to_string()).collect(), ..Self::default() }
    }

    pub fn persisted_ids(&self) -> Vec<String> {
        self.persisted.lock().unwrap().iter().map(|(_, node)| node.id.clone()).collect()
    }

    pub fn persisted(&self) -> Vec<(String, ResourceNode)> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl LeafStore for RecordingLeafStore {
    async fn persist_leaf(&self, owner_id: &str, leaf: &ResourceNode) -> Result<()> {
        if self.failing.contains(&leaf.id) {
            return Err(TideSyncError::Database(format!("cannot store {}", leaf.id)));
        }
        self.persisted.lock().unwrap().push((owner_id.to_string(), leaf.clone()));
        Ok(())
    }
}

/// Records upserted events; fails for a configured set of remote ids.
#[derive(Default)]
pub struct RecordingReconciler {
    upserts: Mutex<Vec<(String, String)>>,
    failing: HashSet<String>,
}

impl RecordingReconciler {
    pub fn failing_on(ids: &[&str]) -> Self {
        Self { failing: ids.iter().map(|id| (*id).to_string()).collect(), ..Self::default() }
    }

    /// `(owner_id, remote_id)` in upsert order
    pub fn upserts(&self) -> Vec<(String, String)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventReconciler for RecordingReconciler {
    async fn upsert(&self, event: &CalendarEvent, owner_id: &str) -> Result<String> {
        if self.failing.contains(&event.remote_id) {
            return Err(TideSyncError::Database(format!("constraint on {}", event.remote_id)));
        }
        self.upserts.lock().unwrap().push((owner_id.to_string(), event.remote_id.clone()));
        Ok(format!("local-{}", event.remote_id))
    }
}

pub fn leaf(id: &str) -> ResourceNode {
    ResourceNode::leaf(id, format!("{id}.txt"))
}

pub fn container(id: &str) -> ResourceNode {
    ResourceNode::container(id, id)
}

pub fn event(remote_id: &str) -> CalendarEvent {
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
        attendees: None,
    }
}

pub fn remote_error(status: u16) -> TideSyncError {
    TideSyncError::Remote { status, message: format!("status {status}") }
}
