//! Torrent search across pluggable index sources.
//!
//! Every source implements the [`Source`] trait and normalizes its results
//! into [`Torrent`] records. The [`Registry`] holds the fixed set of sources
//! built at startup, and the [`Aggregator`] fans a query out to all of them
//! concurrently, downgrading per-source failures to warnings.

mod aggregator;
mod nyaa;
mod nyaa_rss;
mod registry;
pub mod timefmt;
mod types;

pub use aggregator::Aggregator;
pub use nyaa::NyaaSource;
pub use nyaa_rss::NyaaRssSource;
pub use registry::Registry;
pub use types::*;
