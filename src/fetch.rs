//! Timeout-bounded HTTP client shared by every trailer source.
//!
//! A single attempt per call, no retries. The timeout covers the whole
//! exchange (connect, headers and body); when it fires the in-flight future is
//! dropped, which cancels the underlying request.

use std::future::Future;
use std::time::Duration;

use reqwest::{IntoUrl, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(8000);

/// Failure of a bounded fetch. Callers treat every variant the same way; the
/// distinction only exists for logging.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client or request: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone)]
pub struct BoundedFetch {
    client: reqwest::Client,
    timeout: Duration,
}

impl BoundedFetch {
    /// Build a client sending `user_agent` by default and failing any
    /// exchange that takes longer than `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, timeout })
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.client.post(url)
    }

    /// Send `request` and read the body as text within the timeout.
    pub async fn text(&self, request: RequestBuilder) -> Result<String, FetchError> {
        self.exchange(request, |resp| resp.text()).await
    }

    /// Send `request` and decode the body as JSON within the timeout.
    pub async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FetchError> {
        self.exchange(request, |resp| resp.json::<T>()).await
    }

    async fn exchange<T, F, Fut>(&self, request: RequestBuilder, read: F) -> Result<T, FetchError>
    where
        F: FnOnce(Response) -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let request = request.build().map_err(FetchError::Client)?;
        let url = request.url().to_string();
        let client = &self.client;
        let target = url.clone();

        let exchange = async move {
            let resp = client
                .execute(request)
                .await
                .map_err(|source| FetchError::Network {
                    url: target.clone(),
                    source,
                })?;

            let status = resp.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: target,
                    status,
                });
            }

            read(resp)
                .await
                .map_err(|source| FetchError::Decode { url: target, source })
        };

        let outcome = tokio::time::timeout(self.timeout, exchange).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                debug!(url = %url, timeout_ms, "upstream request timed out");
                Err(FetchError::Timeout { url, timeout_ms })
            }
        }
    }
}
