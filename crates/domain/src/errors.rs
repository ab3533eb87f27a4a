//! Error types used throughout the application

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP statuses the remote service uses for conditions worth retrying.
pub const TRANSIENT_STATUSES: [u16; 5] = [408, 500, 502, 503, 504];

/// Main error type for TideSync
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum TideSyncError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// The remote service asked us to slow down (HTTP 429).
    #[error("Rate limited by remote service{}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-2xx answer from the remote service.
    #[error("Remote service returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    retry_after.map(|d| format!(" (retry after {}s)", d.as_secs())).unwrap_or_default()
}

impl TideSyncError {
    /// HTTP status carried by the error, when it came from the remote service.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Explicit rate-limit signal from the remote service.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server, gateway and timeout conditions that are expected to clear up.
    ///
    /// Transport-level failures (timeouts, refused connections) surface as
    /// [`TideSyncError::Network`] and are treated the same way.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Remote { status, .. } => TRANSIENT_STATUSES.contains(status),
            Self::Network(_) => true,
            _ => false,
        }
    }

    /// The remote resource does not exist or is not visible to this owner.
    pub fn is_absent(&self) -> bool {
        matches!(self.status(), Some(404 | 403))
    }
}

/// Result type alias for TideSync operations
pub type Result<T> = std::result::Result<T, TideSyncError>;
