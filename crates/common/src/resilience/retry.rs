//! Generic retry executor with pluggable retry policies
//!
//! The executor runs an async operation, asks a [`RetryPolicy`] what to do
//! with each failure and sleeps between attempts. When the policy stops, or
//! the retry budget runs out, the most recent error is returned unchanged so
//! callers can keep matching on their own error type.
//!
//! Backoff is deterministic. There is no jitter: concurrent callers that hit
//! the same rate limit back off in lockstep.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors raised while building a retry configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RetryConfigError {
    #[error("exponential base must be at least 1, got {0}")]
    InvalidBase(String),
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Decide what to do after a failure. `retries_so_far` is 0 for the first
    /// failure.
    fn should_retry(&self, error: &E, retries_so_far: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry with the configured backoff delay
    Retry,
    /// Retry after a caller-provided delay (e.g. a server hint)
    RetryAfter(Duration),
    /// Return the error to the caller
    Stop,
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// `initial_delay * base^retries_so_far`, capped at `max_delay`
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Delay before the retry following failure number `retries_so_far`
    pub fn calculate_delay(&self, retries_so_far: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(retries_so_far).unwrap_or(i32::MAX);
                let millis = initial_delay.as_millis() as f64 * base.powi(exponent);
                let capped = millis.min(max_delay.as_millis() as f64);
                Duration::from_millis(capped as u64)
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries allowed after the first attempt
    pub max_retries: u32,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    /// Three retries, waiting 1s, 2s, 4s.
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_secs(1),
                base: 2.0,
                max_delay: Duration::from_secs(300),
            },
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::default()
    }

    /// Exponential `base_delay * 2^n` with the given retry budget.
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffStrategy::Exponential {
                initial_delay: base_delay,
                base: 2.0,
                max_delay: Duration::from_secs(300),
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        match &self.backoff {
            BackoffStrategy::Exponential { base, .. } if *base < 1.0 => {
                Err(RetryConfigError::InvalidBase(base.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        base: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = BackoffStrategy::Exponential { initial_delay, base, max_delay };
        self
    }

    pub fn build(self) -> Result<RetryConfig, RetryConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Outcome of a retry execution including result and summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    /// Attempts made, including the first one
    pub attempts: u32,
    /// Time spent sleeping between attempts
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and return outcome statistics.
    #[instrument(skip(self, operation), fields(max_retries = self.config.max_retries))]
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut retries_so_far = 0u32;
        let mut total_delay = Duration::ZERO;

        loop {
            let error = match operation().await {
                Ok(value) => {
                    if retries_so_far > 0 {
                        debug!(retries = retries_so_far, "operation succeeded after retrying");
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: retries_so_far + 1,
                        total_delay,
                    };
                }
                Err(error) => error,
            };

            let delay = match self.policy.should_retry(&error, retries_so_far) {
                RetryDecision::Stop => {
                    debug!(error = %error, "retry policy declined to retry");
                    None
                }
                _ if retries_so_far >= self.config.max_retries => {
                    warn!(
                        attempts = retries_so_far + 1,
                        error = %error,
                        "retry budget exhausted"
                    );
                    None
                }
                RetryDecision::Retry => Some(self.config.backoff.calculate_delay(retries_so_far)),
                RetryDecision::RetryAfter(delay) => Some(delay),
            };

            let Some(delay) = delay else {
                return RetryOutcome { result: Err(error), attempts: retries_so_far + 1, total_delay };
            };

            warn!(
                attempt = retries_so_far + 1,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "operation failed, retrying"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            total_delay += delay;
            retries_so_far += 1;
        }
    }
}
