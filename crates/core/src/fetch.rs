//! HTTP transport collaborator.
//!
//! Sources never talk to the network directly; they go through the [`Fetcher`]
//! trait so tests can script responses. The production implementation is a thin
//! reqwest wrapper that honors per-call TLS verification and proxy options.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Explicit proxy endpoints, keyed by scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyMap {
    /// Proxy URL for plain-HTTP requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    /// Proxy URL for HTTPS requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https: Option<String>,
}

/// Per-call transport options.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Verify TLS certificates.
    pub verify_tls: bool,
    /// Explicit proxies for this call.
    pub proxies: Option<ProxyMap>,
    /// Honor system proxy environment variables.
    pub use_system_proxy: bool,
}

/// Errors that can occur while fetching a page or feed body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request could not be built or sent.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {code} from {url}")]
    Status { code: u16, url: String },

    /// A configured proxy URL was rejected.
    #[error("invalid proxy {url}: {reason}")]
    Proxy { url: String, reason: String },
}

/// Issues a GET request and returns the raw response body as text.
///
/// Works for both HTML pages and feed/XML bodies.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str, opts: &FetchOptions) -> Result<String, FetchError>;
}

/// reqwest-backed [`Fetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the given request timeout.
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Build a client honoring the per-call options.
    ///
    /// Clients are cheap to build relative to a search round-trip, and the
    /// options can change between calls, so no client is cached.
    fn build_client(&self, opts: &FetchOptions) -> Result<reqwest::Client, FetchError> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!opts.verify_tls);

        if !opts.use_system_proxy {
            builder = builder.no_proxy();
        }

        if let Some(map) = &opts.proxies {
            if let Some(url) = &map.http {
                let proxy = reqwest::Proxy::http(url).map_err(|e| FetchError::Proxy {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
                builder = builder.proxy(proxy);
            }
            if let Some(url) = &map.https {
                let proxy = reqwest::Proxy::https(url).map_err(|e| FetchError::Proxy {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
                builder = builder.proxy(proxy);
            }
        }

        Ok(builder.build()?)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(30)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str, opts: &FetchOptions) -> Result<String, FetchError> {
        let client = self.build_client(opts)?;
        let response = client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                code: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
