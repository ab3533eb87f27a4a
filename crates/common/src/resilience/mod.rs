//! Resilience patterns for fault tolerance
//!
//! The retry executor here is generic over the error type. Domain crates
//! supply a [`RetryPolicy`] that classifies their own errors.

pub mod retry;

pub use retry::{
    BackoffStrategy, RetryConfig, RetryConfigBuilder, RetryConfigError, RetryDecision,
    RetryExecutor, RetryOutcome, RetryPolicy,
};
