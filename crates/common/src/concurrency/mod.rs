//! Concurrency helpers for fanning work out across independent items

pub mod dispatcher;

pub use dispatcher::{
    run_concurrent, run_concurrent_cancellable, summarize, DispatchOptions, DispatchSummary,
    Outcome, ProgressFn,
};
