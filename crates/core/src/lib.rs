pub mod config;
pub mod fetch;
pub mod search;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SearchConfig,
};
pub use fetch::{FetchError, FetchOptions, Fetcher, HttpFetcher, ProxyMap};
pub use search::{
    Aggregator, NyaaRssSource, NyaaSource, Registry, SearchError, SearchOptions, Source, SourceId,
    Torrent,
};
