//! Token resolution
//!
//! A [`TokenSource`] is either a fixed bearer string or a provider that is
//! asked for a fresh credential on every call. Callers resolve it right before
//! each outbound request and never hold on to the result.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tidesync_domain::Result;

/// Produces a usable credential on demand.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// Where the credential for a remote call comes from.
#[derive(Clone)]
pub enum TokenSource {
    Fixed(String),
    Provider(Arc<dyn TokenProvider>),
}

impl TokenSource {
    pub fn fixed(token: impl Into<String>) -> Self {
        Self::Fixed(token.into())
    }

    pub fn provider(provider: Arc<dyn TokenProvider>) -> Self {
        Self::Provider(provider)
    }

    /// Wrap an async closure as a provider.
    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        Self::Provider(Arc::new(FnProvider(f)))
    }

    /// Current credential. Providers are awaited on every call.
    pub async fn resolve(&self) -> Result<String> {
        match self {
            Self::Fixed(token) => Ok(token.clone()),
            Self::Provider(provider) => provider.token().await,
        }
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(_) => f.write_str("TokenSource::Fixed(***)"),
            Self::Provider(_) => f.write_str("TokenSource::Provider(..)"),
        }
    }
}

impl From<String> for TokenSource {
    fn from(token: String) -> Self {
        Self::Fixed(token)
    }
}

impl From<&str> for TokenSource {
    fn from(token: &str) -> Self {
        Self::Fixed(token.to_string())
    }
}

struct FnProvider<F>(F);

#[async_trait]
impl<F, Fut> TokenProvider for FnProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send,
{
    async fn token(&self) -> Result<String> {
        (self.0)().await
    }
}
