//! Concurrent fan-out across all registered sources.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::fetch::Fetcher;

use super::registry::Registry;
use super::{SearchOptions, Torrent};

/// Fans a query out to every registered source and merges the results.
pub struct Aggregator {
    registry: Arc<Registry>,
    timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator over an explicitly built registry.
    pub fn new(registry: Arc<Registry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Convenience constructor: build the registry from configuration.
    pub fn from_config(config: &SearchConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(
            Arc::new(Registry::from_config(config, fetcher)),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Search every registered source concurrently and merge the results.
    ///
    /// One task per source, all joined before returning; no partial or
    /// streaming results. A source that fails, panics or exceeds the deadline
    /// contributes nothing and is logged at warn level — one misbehaving
    /// source never aborts the aggregate query. Ordering across sources
    /// follows completion and is unspecified; record order within a single
    /// source's result is preserved.
    pub async fn search(&self, keyword: &str, opts: &SearchOptions) -> Vec<Torrent> {
        let tasks: Vec<_> = self
            .registry
            .sources()
            .map(|source| {
                let source = Arc::clone(source);
                let keyword = keyword.to_string();
                let opts = opts.clone();
                let deadline = self.timeout;
                tokio::spawn(async move {
                    let id = source.id();
                    let outcome =
                        tokio::time::timeout(deadline, source.search(&keyword, &opts)).await;
                    (id, outcome)
                })
            })
            .collect();

        let mut torrents = Vec::new();

        for joined in futures::future::join_all(tasks).await {
            match joined {
                Ok((id, Ok(Ok(Some(mut results))))) => {
                    debug!(source = %id, results = results.len(), "source search complete");
                    torrents.append(&mut results);
                }
                Ok((id, Ok(Ok(None)))) => {
                    debug!(source = %id, "source returned no results");
                }
                Ok((id, Ok(Err(e)))) => {
                    warn!(source = %id, error = %e, "source search failed");
                }
                Ok((id, Err(_))) => {
                    warn!(
                        source = %id,
                        timeout_secs = self.timeout.as_secs(),
                        "source search timed out"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "source task aborted");
                }
            }
        }

        debug!(total = torrents.len(), "aggregate search complete");
        torrents
    }
}
