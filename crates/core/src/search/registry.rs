//! Fixed, process-lifetime collection of search sources.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::fetch::Fetcher;

use super::nyaa::NyaaSource;
use super::nyaa_rss::NyaaRssSource;
use super::{Source, SourceId};

/// Registry of search sources.
///
/// Populated once at startup and read-only afterwards; no source is added or
/// removed mid-query. Membership is by source identity, so registering the
/// same id twice replaces the earlier instance.
#[derive(Default)]
pub struct Registry {
    sources: HashMap<SourceId, Arc<dyn Source>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Build the registry from configuration, constructing every configured
    /// source with the shared transport.
    pub fn from_config(config: &SearchConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let mut registry = Self::new();
        for id in &config.sources {
            let source: Arc<dyn Source> = match id {
                SourceId::Nyaa => Arc::new(NyaaSource::new(config, Arc::clone(&fetcher))),
                SourceId::NyaaRss => Arc::new(NyaaRssSource::new(config, Arc::clone(&fetcher))),
            };
            registry.register(source);
        }
        registry
    }

    /// Add a source instance.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.id(), source);
    }

    /// Look up a source by identity.
    pub fn get(&self, id: SourceId) -> Option<&Arc<dyn Source>> {
        self.sources.get(&id)
    }

    /// Iterate over the registered sources. Order is unspecified.
    pub fn sources(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.values()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
