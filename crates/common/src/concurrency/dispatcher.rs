//! Bounded-concurrency fan-out over independent work items
//!
//! Every item runs the same async task. At most `concurrency` tasks are in
//! flight and a new one starts as soon as any slot frees up. One failing item
//! never affects its siblings: its error is captured in its [`Outcome`] and the
//! dispatcher moves on.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Callback invoked after each completion with `(completed, total)`.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Result of running the task for one input item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<I, T, E> {
    pub item: I,
    pub result: Result<T, E>,
}

impl<I, T, E> Outcome<I, T, E> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

/// Options for a dispatch run
#[derive(Clone)]
pub struct DispatchOptions {
    /// Maximum tasks in flight. Zero is treated as one.
    pub concurrency: usize,
    /// Fired after every completion, success or failure
    pub on_progress: Option<ProgressFn>,
}

impl DispatchOptions {
    pub fn new(concurrency: usize) -> Self {
        Self { concurrency, on_progress: None }
    }

    #[must_use]
    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self::new(5)
    }
}

impl fmt::Debug for DispatchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchOptions")
            .field("concurrency", &self.concurrency)
            .field("on_progress", &self.on_progress.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Order-independent reduction of a set of outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Count successes and failures
pub fn summarize<I, T, E>(outcomes: &[Outcome<I, T, E>]) -> DispatchSummary {
    outcomes.iter().fold(DispatchSummary::default(), |mut summary, outcome| {
        if outcome.is_success() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        summary
    })
}

/// Run `task` for every item, bounded by `options.concurrency`
///
/// Resolves after every item has finished. Outcomes are returned in input
/// order, one per item.
#[instrument(skip_all, fields(total = items.len(), concurrency = options.effective_concurrency()))]
pub async fn run_concurrent<I, T, E, F, Fut>(
    items: Vec<I>,
    task: F,
    options: DispatchOptions,
) -> Vec<Outcome<I, T, E>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    dispatch(items, task, &options, None::<(&CancellationToken, fn(&I) -> E)>).await
}

/// Like [`run_concurrent`], but stops launching new items once `token` is
/// cancelled
///
/// Items already running finish normally. Items that had not started get an
/// outcome built by `on_cancel`, so the result still has one entry per input.
#[instrument(skip_all, fields(total = items.len(), concurrency = options.effective_concurrency()))]
pub async fn run_concurrent_cancellable<I, T, E, F, Fut, C>(
    items: Vec<I>,
    task: F,
    options: DispatchOptions,
    token: &CancellationToken,
    on_cancel: C,
) -> Vec<Outcome<I, T, E>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&I) -> E,
{
    dispatch(items, task, &options, Some((token, on_cancel))).await
}

async fn dispatch<I, T, E, F, Fut, C>(
    items: Vec<I>,
    task: F,
    options: &DispatchOptions,
    cancel: Option<(&CancellationToken, C)>,
) -> Vec<Outcome<I, T, E>>
where
    I: Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&I) -> E,
{
    let total = items.len();
    let completed = AtomicUsize::new(0);
    let mut slots: Vec<Option<Outcome<I, T, E>>> = (0..total).map(|_| None).collect();

    let task = &task;
    let completed = &completed;
    let cancel = cancel.as_ref();
    let progress = options.on_progress.as_ref();

    // buffer_unordered polls a future for the first time only once a slot is
    // free, so the cancellation check below runs at launch time.
    let mut running = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| async move {
            let result = match cancel {
                Some((token, on_cancel)) if token.is_cancelled() => Err(on_cancel(&item)),
                _ => task(item.clone()).await,
            };

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(progress) = progress {
                progress(done, total);
            }

            (index, Outcome { item, result })
        })
        .buffer_unordered(options.effective_concurrency());

    while let Some((index, outcome)) = running.next().await {
        slots[index] = Some(outcome);
    }

    debug!(total, "dispatch complete");
    slots.into_iter().flatten().collect()
}
