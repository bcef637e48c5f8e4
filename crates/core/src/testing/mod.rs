//! Testing utilities and mock implementations.
//!
//! Mock implementations of the transport and source traits, allowing the
//! search pipeline to be exercised without network access.

mod mock_fetcher;
mod mock_source;

pub use mock_fetcher::{MockFetcher, RecordedFetch};
pub use mock_source::{MockSource, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::search::Torrent;

    /// A magnet-only record, as the paginated HTML source emits.
    pub fn magnet_torrent(title: &str) -> Torrent {
        Torrent {
            release_time: "2024/06/15 10:30".to_string(),
            title: title.to_string(),
            size: "1.2 GiB".to_string(),
            magnet: Some(format!("magnet:?xt=urn:btih:{title}")),
            torrent_url: None,
            info_hash: None,
        }
    }

    /// A torrent-file record with info hash, as the feed source emits.
    pub fn feed_torrent(title: &str) -> Torrent {
        Torrent {
            release_time: "2024/06/15 10:30".to_string(),
            title: title.to_string(),
            size: "1.2 GiB".to_string(),
            magnet: None,
            torrent_url: Some(format!("https://nyaa.si/download/{title}.torrent")),
            info_hash: Some(format!("{title}0000000000000000000000000000000000")),
        }
    }
}
