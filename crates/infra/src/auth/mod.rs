//! Credential providers for the remote collection service

pub mod refresh;

pub use refresh::{Credential, CredentialRefresher, SharedRefreshProvider, DEFAULT_REFRESH_SKEW_SECS};
