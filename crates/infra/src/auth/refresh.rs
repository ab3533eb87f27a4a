//! Token provider that refreshes credentials once for all concurrent callers.
//!
//! The refreshed credential is cached until it comes within `skew` of its
//! expiry. While a refresh is running, every caller awaits the same shared
//! future instead of starting its own.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tidesync_core::TokenProvider;
use tidesync_domain::Result;
use tracing::{debug, info, instrument, warn};

/// Default margin before expiry at which a credential is refreshed.
pub const DEFAULT_REFRESH_SKEW_SECS: i64 = 300;

/// Access token and its expiry
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    /// `None` means the credential never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { access_token: access_token.into(), expires_at }
    }

    /// Credential valid for `lifetime` from now
    pub fn expiring_in(access_token: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(access_token, Some(Utc::now() + lifetime))
    }

    fn is_fresh(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.expires_at.map_or(true, |at| now + skew < at)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Obtains a new credential, e.g. through an OAuth refresh-token grant
#[async_trait]
pub trait CredentialRefresher: Send + Sync {
    async fn refresh(&self) -> Result<Credential>;
}

type InFlight = Shared<BoxFuture<'static, Result<Credential>>>;

enum Lookup {
    Fresh(String),
    Refresh(InFlight),
}

#[derive(Default)]
struct RefreshState {
    cached: Option<Credential>,
    in_flight: Option<InFlight>,
}

/// [`TokenProvider`] that coalesces concurrent refreshes
pub struct SharedRefreshProvider {
    refresher: Arc<dyn CredentialRefresher>,
    skew: Duration,
    state: Mutex<RefreshState>,
}

impl fmt::Debug for SharedRefreshProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SharedRefreshProvider")
            .field("skew", &self.skew)
            .field("cached", &state.cached)
            .field("refreshing", &state.in_flight.is_some())
            .finish()
    }
}

impl SharedRefreshProvider {
    pub fn new(refresher: Arc<dyn CredentialRefresher>) -> Self {
        Self {
            refresher,
            skew: Duration::seconds(DEFAULT_REFRESH_SKEW_SECS),
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// Refresh this long before the cached credential expires
    pub fn with_skew(mut self, skew: Duration) -> Self {
        self.skew = skew;
        self
    }

    /// Seed the cache, e.g. with a credential loaded at startup
    pub fn with_credential(self, credential: Credential) -> Self {
        self.state.lock().cached = Some(credential);
        self
    }

    /// Drop the cached credential so the next call refreshes
    pub fn invalidate(&self) {
        self.state.lock().cached = None;
    }

    /// Cached credential, or the shared refresh every caller should await
    fn lookup(&self) -> Lookup {
        let mut state = self.state.lock();

        if let Some(credential) = &state.cached {
            if credential.is_fresh(Utc::now(), self.skew) {
                return Lookup::Fresh(credential.access_token.clone());
            }
        }

        if let Some(in_flight) = &state.in_flight {
            debug!("joining in-flight credential refresh");
            return Lookup::Refresh(in_flight.clone());
        }

        let refresher = Arc::clone(&self.refresher);
        let refresh = async move { refresher.refresh().await }.boxed().shared();
        state.in_flight = Some(refresh.clone());
        debug!("starting credential refresh");
        Lookup::Refresh(refresh)
    }

    fn settle(&self, refresh: &InFlight, result: &Result<Credential>) {
        let mut state = self.state.lock();
        if !state.in_flight.as_ref().is_some_and(|current| current.ptr_eq(refresh)) {
            return;
        }
        state.in_flight = None;
        if let Ok(credential) = result {
            state.cached = Some(credential.clone());
        }
    }
}

#[async_trait]
impl TokenProvider for SharedRefreshProvider {
    #[instrument(skip(self))]
    async fn token(&self) -> Result<String> {
        let refresh = match self.lookup() {
            Lookup::Fresh(token) => return Ok(token),
            Lookup::Refresh(refresh) => refresh,
        };

        let result = refresh.clone().await;
        self.settle(&refresh, &result);

        match result {
            Ok(credential) => {
                info!(expires_at = ?credential.expires_at, "credential refreshed");
                Ok(credential.access_token)
            }
            Err(err) => {
                warn!(error = %err, "credential refresh failed");
                Err(err)
            }
        }
    }
}
