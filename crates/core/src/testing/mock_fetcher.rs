//! Mock fetcher for exercising sources without network access.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;

use crate::fetch::{FetchError, FetchOptions, Fetcher};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// Requested URL.
    pub url: String,
    /// Transport options the source passed down.
    pub opts: FetchOptions,
}

/// Mock implementation of the [`Fetcher`] trait.
///
/// Responses are scripted either per exact URL or as an ordered queue; every
/// request is recorded for assertions. A request with no scripted response
/// fails with a 404 status error.
#[derive(Default)]
pub struct MockFetcher {
    scripted: RwLock<VecDeque<String>>,
    by_url: RwLock<HashMap<String, String>>,
    fail_status: RwLock<Option<u16>>,
    requests: RwLock<Vec<RecordedFetch>>,
}

impl MockFetcher {
    /// Create a mock fetcher with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response body; queued bodies are served in push order.
    pub async fn push_response(&self, body: impl Into<String>) {
        self.scripted.write().await.push_back(body.into());
    }

    /// Script a response for one exact URL. Takes precedence over the queue.
    pub async fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        self.by_url.write().await.insert(url.into(), body.into());
    }

    /// Make every subsequent fetch fail with the given HTTP status.
    pub async fn set_fail_status(&self, code: u16) {
        *self.fail_status.write().await = Some(code);
    }

    /// Get recorded requests.
    pub async fn requests(&self) -> Vec<RecordedFetch> {
        self.requests.read().await.clone()
    }

    /// Get the number of requests performed.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &str, opts: &FetchOptions) -> Result<String, FetchError> {
        self.requests.write().await.push(RecordedFetch {
            url: url.to_string(),
            opts: opts.clone(),
        });

        if let Some(code) = *self.fail_status.read().await {
            return Err(FetchError::Status {
                code,
                url: url.to_string(),
            });
        }

        if let Some(body) = self.by_url.read().await.get(url) {
            return Ok(body.clone());
        }

        if let Some(body) = self.scripted.write().await.pop_front() {
            return Ok(body);
        }

        Err(FetchError::Status {
            code: 404,
            url: url.to_string(),
        })
    }
}
