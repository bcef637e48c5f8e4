use serde::{Deserialize, Serialize};

use crate::search::{timefmt, SourceId};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
}

/// Search configuration, fixed at source construction and immutable afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Sources registered at startup.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceId>,
    /// HTML parser backend identifier. Feed sources ignore it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
    /// Verify TLS certificates when talking to sources (default: off, public
    /// indexers are frequently behind self-signed mirrors).
    #[serde(default)]
    pub verify_tls: bool,
    /// Output pattern applied to every emitted release time.
    #[serde(default = "default_timefmt")]
    pub timefmt: String,
    /// Upper bound on result pages walked per paginated source.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Per-source deadline applied by the aggregator, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            parser: None,
            verify_tls: false,
            timefmt: default_timefmt(),
            max_pages: default_max_pages(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_sources() -> Vec<SourceId> {
    vec![SourceId::Nyaa, SourceId::NyaaRss]
}

fn default_timefmt() -> String {
    timefmt::DEFAULT_TIMEFMT.to_string()
}

fn default_max_pages() -> u32 {
    100
}

fn default_timeout() -> u64 {
    30
}
