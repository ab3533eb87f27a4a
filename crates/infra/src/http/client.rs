use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tidesync_domain::constants::{DEFAULT_REMOTE_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use tidesync_domain::TideSyncError;
use tracing::debug;

use crate::errors::InfraError;

/// HTTP transport with timeout and user agent applied to every request.
///
/// Each request is sent exactly once. Retrying is the caller's decision
/// (see `tidesync_core::sync::retry`).
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, TideSyncError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the request once.
    ///
    /// Non-2xx responses are returned as-is; only transport failures become
    /// errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, TideSyncError> {
        let request = builder.build().map_err(|err| TideSyncError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: String,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient, TideSyncError> {
        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).user_agent(self.user_agent).no_proxy();

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| TideSyncError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}
