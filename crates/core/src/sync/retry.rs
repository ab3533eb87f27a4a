//! Retry classification for remote calls
//!
//! Rate-limited answers wait out the server hint when one is given and fall
//! back to exponential backoff otherwise. Transient statuses and transport
//! failures back off exponentially. Everything else stops at once.

use tidesync_common::resilience::{RetryConfig, RetryDecision, RetryExecutor, RetryPolicy};
use tidesync_domain::{SyncConfig, TideSyncError};

/// Retry policy for [`TideSyncError`]s raised by remote calls
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteRetryPolicy;

impl RetryPolicy<TideSyncError> for RemoteRetryPolicy {
    fn should_retry(&self, error: &TideSyncError, _retries_so_far: u32) -> RetryDecision {
        match error {
            TideSyncError::RateLimited { retry_after: Some(hint) } => {
                RetryDecision::RetryAfter(*hint)
            }
            TideSyncError::RateLimited { retry_after: None } => RetryDecision::Retry,
            err if err.is_transient() => RetryDecision::Retry,
            _ => RetryDecision::Stop,
        }
    }
}

/// Executor used around every remote call
pub type RemoteRetry = RetryExecutor<RemoteRetryPolicy>;

/// Build the remote retry executor from sync settings
pub fn remote_retry(config: &SyncConfig) -> RemoteRetry {
    RetryExecutor::new(
        RetryConfig::exponential(config.max_retries, config.base_backoff()),
        RemoteRetryPolicy,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn remote(status: u16) -> TideSyncError {
        TideSyncError::Remote { status, message: format!("status {status}") }
    }

    #[test]
    fn rate_limit_hint_is_honoured() {
        let err = TideSyncError::RateLimited { retry_after: Some(Duration::from_secs(3)) };
        assert_eq!(
            RemoteRetryPolicy.should_retry(&err, 0),
            RetryDecision::RetryAfter(Duration::from_secs(3))
        );
    }

    #[test]
    fn rate_limit_without_hint_uses_backoff() {
        let err = TideSyncError::RateLimited { retry_after: None };
        assert_eq!(RemoteRetryPolicy.should_retry(&err, 2), RetryDecision::Retry);
    }

    #[test]
    fn transient_and_terminal_statuses() {
        for status in [408, 500, 502, 503, 504] {
            assert_eq!(RemoteRetryPolicy.should_retry(&remote(status), 0), RetryDecision::Retry);
        }
        for status in [400, 401, 403, 404, 409, 501] {
            assert_eq!(RemoteRetryPolicy.should_retry(&remote(status), 0), RetryDecision::Stop);
        }
        assert_eq!(
            RemoteRetryPolicy.should_retry(&TideSyncError::Network("reset".into()), 0),
            RetryDecision::Retry
        );
        assert_eq!(
            RemoteRetryPolicy.should_retry(&TideSyncError::Cancelled, 0),
            RetryDecision::Stop
        );
    }

    #[tokio::test]
    async fn exhausted_retries_return_last_error() {
        let config = SyncConfig { max_retries: 2, base_backoff_ms: 0, ..SyncConfig::default() };
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), TideSyncError> = remote_retry(&config)
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(TideSyncError::Remote { status: 503, message: format!("try {n}") })
                }
            })
            .await;

        assert_eq!(result, Err(TideSyncError::Remote { status: 503, message: "try 2".into() }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn terminal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), TideSyncError> = remote_retry(&SyncConfig::default())
            .execute(|| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(remote(400))
                }
            })
            .await;

        assert_eq!(result, Err(remote(400)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
