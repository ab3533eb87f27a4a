//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the filter passed in. Initialising twice
//! is reported as an error instead of panicking.

use tidesync_domain::{Result, TideSyncError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor a directive is provided.
pub const DEFAULT_FILTER: &str = "info,tidesync=debug";

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event, for log aggregation
    Json,
}

/// Install the global tracing subscriber.
///
/// # Errors
/// Returns `TideSyncError::Config` if `filter` is not a valid directive or a
/// global subscriber is already installed.
pub fn init_tracing(filter: &str, format: LogFormat) -> Result<()> {
    let filter_layer = build_filter(filter)?;

    let registry = tracing_subscriber::registry().with(filter_layer);
    let installed = match format {
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .flatten_event(true),
            )
            .try_init(),
    };

    installed.map_err(|e| TideSyncError::Config(format!("tracing already initialised: {e}")))?;
    tracing::info!(filter = %filter, ?format, "Logging initialized");
    Ok(())
}

fn build_filter(filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .map_err(|e| TideSyncError::Config(format!("invalid log filter '{filter}': {e}")))
}
