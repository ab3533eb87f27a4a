//! Integration tests for the retry executor and the dispatcher working
//! together, the way sync code composes them.

#![cfg(feature = "runtime")]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tidesync_common::concurrency::{run_concurrent, summarize, DispatchOptions, DispatchSummary};
use tidesync_common::resilience::{RetryConfig, RetryDecision, RetryExecutor, RetryPolicy};

#[derive(Debug, Clone, PartialEq)]
enum RemoteError {
    Busy,
    Throttled(Duration),
    Fatal(&'static str),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

struct RemotePolicy;

impl RetryPolicy<RemoteError> for RemotePolicy {
    fn should_retry(&self, error: &RemoteError, _retries_so_far: u32) -> RetryDecision {
        match error {
            RemoteError::Busy => RetryDecision::Retry,
            RemoteError::Throttled(hint) => RetryDecision::RetryAfter(*hint),
            RemoteError::Fatal(_) => RetryDecision::Stop,
        }
    }
}

fn fast_executor() -> RetryExecutor<RemotePolicy> {
    RetryExecutor::new(RetryConfig::exponential(3, Duration::from_millis(1)), RemotePolicy)
}

/// Each item retries independently inside its own dispatcher slot; a terminal
/// failure on one item is reported without touching the others.
#[tokio::test(flavor = "multi_thread")]
async fn test_per_item_retry_inside_dispatch() {
    let attempts: Arc<Mutex<HashMap<&'static str, u32>>> = Arc::default();
    let executor = Arc::new(fast_executor());

    let outcomes = run_concurrent(
        vec!["flaky", "fatal", "steady"],
        |item| {
            let attempts = Arc::clone(&attempts);
            let executor = Arc::clone(&executor);
            async move {
                executor
                    .execute(|| {
                        let attempts = Arc::clone(&attempts);
                        async move {
                            let n = {
                                let mut map = attempts.lock().unwrap();
                                let entry = map.entry(item).or_insert(0);
                                *entry += 1;
                                *entry
                            };
                            match item {
                                "flaky" if n < 3 => Err(RemoteError::Busy),
                                "fatal" => Err(RemoteError::Fatal("gone")),
                                _ => Ok(n),
                            }
                        }
                    })
                    .await
            }
        },
        DispatchOptions::new(2),
    )
    .await;

    assert_eq!(outcomes[0].result, Ok(3));
    assert_eq!(outcomes[1].result, Err(RemoteError::Fatal("gone")));
    assert_eq!(outcomes[2].result, Ok(1));
    assert_eq!(summarize(&outcomes), DispatchSummary { succeeded: 2, failed: 1 });

    let attempts = attempts.lock().unwrap();
    assert_eq!(attempts["fatal"], 1);
}

#[tokio::test]
async fn test_server_hint_is_waited_out() {
    let calls = Arc::new(AtomicU32::new(0));
    let executor = fast_executor();
    let start = Instant::now();

    let result = executor
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(RemoteError::Throttled(Duration::from_millis(50)))
                } else {
                    Ok("page")
                }
            }
        })
        .await;

    assert_eq!(result, Ok("page"));
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_exhausted_retries_make_max_plus_one_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let executor = RetryExecutor::new(RetryConfig::exponential(3, Duration::ZERO), RemotePolicy);

    let result: Result<(), RemoteError> = executor
        .execute(|| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::Busy)
            }
        })
        .await;

    assert_eq!(result, Err(RemoteError::Busy));
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}
