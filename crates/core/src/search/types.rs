//! Types for the search aggregation system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::fetch::{FetchError, ProxyMap};

/// A normalized search hit.
///
/// A record is actionable when at least one of `magnet` / `torrent_url` is
/// present; sources may emit partial records and the model does not enforce
/// this. Absent fields are `None`, never empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Torrent {
    /// Release time, already formatted with the configured time pattern.
    pub release_time: String,
    /// Release title.
    pub title: String,
    /// Free-form size string as reported by the source (e.g. "1.2 GiB").
    pub size: String,
    /// Magnet URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet: Option<String>,
    /// Direct .torrent download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub torrent_url: Option<String>,
    /// Info hash (hex).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
}

/// Identity of a search source, used for registry membership and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Nyaa,
    NyaaRss,
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Nyaa => write!(f, "nyaa"),
            SourceId::NyaaRss => write!(f, "nyaa_rss"),
        }
    }
}

/// Per-call search options, shared read-only by every source.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Search the caller's collected/favorited listing instead of the public
    /// index. Sources without such a listing warn and ignore the flag.
    pub collected: bool,
    /// Explicit proxies for this call.
    pub proxies: Option<ProxyMap>,
    /// Honor system proxy environment variables.
    pub use_system_proxy: bool,
    /// Extra query parameters forwarded verbatim to the source. Unknown keys
    /// are never validated or stripped.
    pub extra_params: Vec<(String, String)>,
}

/// Errors that can occur during a single source invocation.
#[derive(Debug, Error)]
pub enum SearchError {
    /// A fetched page or feed did not have the expected structure. Fatal to
    /// the invocation that encountered it; partial results are discarded.
    #[error("{source_id}: failed to parse {context}: {reason}")]
    Parse {
        source_id: SourceId,
        context: String,
        reason: String,
    },

    /// Transport failure, propagated unchanged from the fetch collaborator.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl SearchError {
    /// Creates a parser error carrying the page/item context and the cause.
    pub fn parse(
        source_id: SourceId,
        context: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::Parse {
            source_id,
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// A pluggable search source backend.
///
/// Implementations are constructed once from configuration, hold no per-query
/// state and are reused across many searches.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identity of this source.
    fn id(&self) -> SourceId;

    /// Search the source for `keyword`.
    ///
    /// The caller is responsible for passing a non-empty keyword. Returns
    /// `Ok(None)` when the source signals "no results" as absence;
    /// `Ok(Some(vec![]))` is the equivalent zero-hit outcome for sources that
    /// always return a sequence. Callers treat both the same.
    async fn search(
        &self,
        keyword: &str,
        opts: &SearchOptions,
    ) -> Result<Option<Vec<Torrent>>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_serialization_skips_absent_fields() {
        let torrent = Torrent {
            release_time: "2024/06/15 10:30".to_string(),
            title: "[Group] Some Show - 01".to_string(),
            size: "1.2 GiB".to_string(),
            magnet: Some("magnet:?xt=urn:btih:abc123".to_string()),
            torrent_url: None,
            info_hash: None,
        };

        let json = serde_json::to_string(&torrent).unwrap();
        assert!(json.contains("magnet"));
        assert!(!json.contains("torrent_url"));
        assert!(!json.contains("info_hash"));

        let parsed: Torrent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, torrent);
    }

    #[test]
    fn test_source_id_serialization() {
        assert_eq!(serde_json::to_string(&SourceId::Nyaa).unwrap(), "\"nyaa\"");
        assert_eq!(
            serde_json::to_string(&SourceId::NyaaRss).unwrap(),
            "\"nyaa_rss\""
        );
    }

    #[test]
    fn test_source_id_display_matches_serde_naming() {
        assert_eq!(SourceId::Nyaa.to_string(), "nyaa");
        assert_eq!(SourceId::NyaaRss.to_string(), "nyaa_rss");
    }

    #[test]
    fn test_parse_error_display() {
        let err = SearchError::parse(SourceId::Nyaa, "results page 3", "missing cell");
        let msg = err.to_string();
        assert!(msg.contains("nyaa"));
        assert!(msg.contains("results page 3"));
        assert!(msg.contains("missing cell"));
    }

    #[test]
    fn test_fetch_error_is_transparent() {
        let err = SearchError::from(FetchError::Status {
            code: 502,
            url: "https://nyaa.si/".to_string(),
        });
        assert!(err.to_string().contains("502"));
    }
}
