//! HTTP adapter for the `PageSource` port
//!
//! Listings are fetched with bearer authentication and decoded as
//! [`Page<T>`]. Status codes are classified here so the core retry policy
//! only sees domain errors:
//!
//! - 2xx: the body is decoded as a page
//! - 429: [`TideSyncError::RateLimited`] with the `Retry-After` hint
//! - anything else: [`TideSyncError::Remote`] with the status and a short
//!   excerpt of the body

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tidesync_core::PageSource;
use tidesync_domain::{Page, RemoteConfig, Result, TideSyncError};
use tracing::{debug, instrument, warn};
use url::Url;

use super::client::HttpClient;
use crate::errors::InfraError;

const MAX_ERROR_BODY_CHARS: usize = 256;

/// Remote listing fetched over HTTP
pub struct HttpPageSource<T> {
    client: HttpClient,
    base_url: Url,
    _items: PhantomData<fn() -> T>,
}

impl<T> Clone for HttpPageSource<T> {
    fn clone(&self) -> Self {
        Self { client: self.client.clone(), base_url: self.base_url.clone(), _items: PhantomData }
    }
}

impl<T> std::fmt::Debug for HttpPageSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPageSource").field("base_url", &self.base_url.as_str()).finish()
    }
}

impl<T> HttpPageSource<T> {
    /// # Errors
    /// Returns `TideSyncError::Config` if `base_url` is not an absolute URL.
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            TideSyncError::Config(format!("invalid remote base URL '{base_url}': {e}"))
        })?;
        Ok(Self { client, base_url, _items: PhantomData })
    }

    /// Client and base URL from the remote section of the configuration
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let client = HttpClient::builder().timeout(config.timeout()).build()?;
        Self::new(client, &config.base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URLs (cursors) are used verbatim; anything else is appended
    /// to the base URL, keeping the base path.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        if let Ok(url) = Url::parse(path) {
            return Ok(url);
        }

        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined)
            .map_err(|e| TideSyncError::InvalidInput(format!("invalid listing path '{path}': {e}")))
    }
}

#[async_trait]
impl<T> PageSource<T> for HttpPageSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    #[instrument(skip(self, token), fields(base = %self.base_url))]
    async fn fetch_page(&self, path: &str, token: &str) -> Result<Page<T>> {
        let url = self.resolve(path)?;
        let request = self
            .client
            .request(Method::GET, url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");

        let response = self.client.send(request).await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers(), Utc::now());
            warn!(?retry_after, "remote service rate limited the listing");
            return Err(TideSyncError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = error_message(status, response.text().await.unwrap_or_default());
            debug!(status = status.as_u16(), %message, "listing request rejected");
            return Err(TideSyncError::Remote { status: status.as_u16(), message });
        }

        let page = response.json::<Page<T>>().await.map_err(InfraError::from)?;
        debug!(items = page.items.len(), has_more = page.has_more(), "page received");
        Ok(page)
    }
}

/// `Retry-After` as delay-seconds or an HTTP date
fn parse_retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn error_message(status: StatusCode, body: String) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.canonical_reason().unwrap_or("unknown status").to_string();
    }
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
