//! Mock source for aggregator and registry tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::search::{SearchError, SearchOptions, Source, SourceId, Torrent};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The keyword that was searched.
    pub keyword: String,
    /// The options the caller passed.
    pub opts: SearchOptions,
}

enum Behavior {
    Results(Option<Vec<Torrent>>),
    Fail,
    Panic,
}

/// Mock implementation of the [`Source`] trait.
///
/// Behavior is fixed at construction: return configured results, fail with a
/// parser error, or panic. An optional delay simulates a slow source for
/// deadline tests. Every call is recorded.
pub struct MockSource {
    id: SourceId,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<RecordedSearch>>>,
}

impl MockSource {
    /// A source returning zero hits as an empty sequence.
    pub fn new(id: SourceId) -> Self {
        Self::with_results(id, Vec::new())
    }

    /// A source returning the given records.
    pub fn with_results(id: SourceId, results: Vec<Torrent>) -> Self {
        Self {
            id,
            behavior: Behavior::Results(Some(results)),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A source signaling "no results" as absence.
    pub fn returning_none(id: SourceId) -> Self {
        Self {
            id,
            behavior: Behavior::Results(None),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A source that always fails with a parser error.
    pub fn failing(id: SourceId) -> Self {
        Self {
            id,
            behavior: Behavior::Fail,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A source that panics when searched.
    pub fn panicking(id: SourceId) -> Self {
        Self {
            id,
            behavior: Behavior::Panic,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Delay every search by `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle on the recorded calls, usable after the source moved into a
    /// registry.
    pub fn calls(&self) -> Arc<Mutex<Vec<RecordedSearch>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> SourceId {
        self.id
    }

    async fn search(
        &self,
        keyword: &str,
        opts: &SearchOptions,
    ) -> Result<Option<Vec<Torrent>>, SearchError> {
        self.calls.lock().await.push(RecordedSearch {
            keyword: keyword.to_string(),
            opts: opts.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Results(results) => Ok(results.clone()),
            Behavior::Fail => Err(SearchError::parse(self.id, "mock", "injected failure")),
            Behavior::Panic => panic!("mock source panic"),
        }
    }
}
