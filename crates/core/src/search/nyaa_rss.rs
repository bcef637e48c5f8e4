//! Single-shot RSS source for the nyaa.si index.
//!
//! One fetch, one parse: the feed flavor of the index returns every hit in a
//! single document, with the info hash and size carried in namespaced
//! extension elements. Links point at .torrent files, never magnets.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::fetch::{FetchOptions, Fetcher};

use super::timefmt;
use super::{SearchError, SearchOptions, Source, SourceId, Torrent};

const BASE_URL: &str = "https://nyaa.si/?page=rss";
/// Fixed category filter: all anime.
const CATEGORY: &str = "1_0";
/// Timestamp pattern used in `pubDate`, including the timezone offset.
const NATIVE_TIMEFMT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Feed-based search source.
pub struct NyaaRssSource {
    fetcher: Arc<dyn Fetcher>,
    verify_tls: bool,
    timefmt: String,
}

impl NyaaRssSource {
    /// Create a source bound to the given configuration and transport.
    pub fn new(config: &SearchConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        if config.parser.is_some() {
            warn!("feed sources do not need an html parser, the setting is ignored");
        }

        Self {
            fetcher,
            verify_tls: config.verify_tls,
            timefmt: config.timefmt.clone(),
        }
    }

    /// Build the feed query URL.
    fn build_feed_url(&self, keyword: &str, extra_params: &[(String, String)]) -> String {
        let mut url = format!(
            "{}&q={}&c={}",
            BASE_URL,
            urlencoding::encode(keyword),
            CATEGORY
        );

        for (key, value) in extra_params {
            url.push_str(&format!(
                "&{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            ));
        }

        url
    }
}

#[async_trait]
impl Source for NyaaRssSource {
    fn id(&self) -> SourceId {
        SourceId::NyaaRss
    }

    async fn search(
        &self,
        keyword: &str,
        opts: &SearchOptions,
    ) -> Result<Option<Vec<Torrent>>, SearchError> {
        if opts.collected {
            warn!(
                source = %self.id(),
                "collected search is not supported, searching the public feed"
            );
        }

        let fetch_opts = FetchOptions {
            verify_tls: self.verify_tls,
            proxies: opts.proxies.clone(),
            use_system_proxy: opts.use_system_proxy,
        };

        let url = self.build_feed_url(keyword, &opts.extra_params);
        debug!(source = %self.id(), "fetching feed");

        let xml = self.fetcher.fetch_text(&url, &fetch_opts).await?;
        let parsed = parse_feed(&xml, &self.timefmt)?;

        if let Some(torrents) = &parsed {
            debug!(source = %self.id(), items = torrents.len(), "parsed feed");
        } else {
            debug!(source = %self.id(), "feed returned no items");
        }

        Ok(parsed)
    }
}

/// Fields of one feed item, accumulated while walking the XML events.
#[derive(Default)]
struct ItemFields {
    title: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
    info_hash: Option<String>,
    size: Option<String>,
}

impl ItemFields {
    fn into_torrent(self, timefmt_out: &str) -> Result<Torrent, SearchError> {
        let title = self
            .title
            .ok_or_else(|| feed_error("feed item without a title"))?;
        let link = self
            .link
            .ok_or_else(|| feed_error(format!("feed item {title:?} without a link")))?;
        let raw_date = self
            .pub_date
            .ok_or_else(|| feed_error(format!("feed item {title:?} without a pubDate")))?;
        let release_time = timefmt::reformat_offset(&raw_date, NATIVE_TIMEFMT, timefmt_out)
            .map_err(|e| feed_error(format!("malformed pubDate {raw_date:?}: {e}")))?;
        let info_hash = self
            .info_hash
            .ok_or_else(|| feed_error(format!("feed item {title:?} without an info hash")))?;
        let size = self
            .size
            .ok_or_else(|| feed_error(format!("feed item {title:?} without a size")))?;

        Ok(Torrent {
            release_time,
            title,
            size,
            magnet: None,
            torrent_url: Some(link),
            info_hash: Some(info_hash),
        })
    }
}

/// Element currently being read inside an item.
enum ItemField {
    Title,
    Link,
    PubDate,
    InfoHash,
    Size,
}

/// Parse the feed document.
///
/// Returns `None` for a feed with zero items ("no results" as absence). Any
/// structurally malformed item aborts the whole parse.
fn parse_feed(xml: &str, timefmt_out: &str) -> Result<Option<Vec<Torrent>>, SearchError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut torrents = Vec::new();
    let mut item: Option<ItemFields> = None;
    let mut field: Option<ItemField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                field = match e.name().as_ref() {
                    b"item" => {
                        item = Some(ItemFields::default());
                        None
                    }
                    b"title" => Some(ItemField::Title),
                    b"link" => Some(ItemField::Link),
                    b"pubDate" => Some(ItemField::PubDate),
                    b"nyaa:infoHash" => Some(ItemField::InfoHash),
                    b"nyaa:size" => Some(ItemField::Size),
                    _ => None,
                };
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| feed_error(format!("malformed text node: {e}")))?;
                record_field(&mut item, &field, text.into_owned());
            }
            Ok(Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                record_field(&mut item, &field, text);
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"item" {
                    let fields = item
                        .take()
                        .ok_or_else(|| feed_error("item end tag without a matching start"))?;
                    torrents.push(fields.into_torrent(timefmt_out)?);
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(feed_error(format!("malformed feed: {e}"))),
            Ok(_) => {}
        }
    }

    if torrents.is_empty() {
        Ok(None)
    } else {
        Ok(Some(torrents))
    }
}

fn record_field(item: &mut Option<ItemFields>, field: &Option<ItemField>, text: String) {
    if let (Some(item), Some(field)) = (item.as_mut(), field.as_ref()) {
        match field {
            ItemField::Title => item.title = Some(text),
            ItemField::Link => item.link = Some(text),
            ItemField::PubDate => item.pub_date = Some(text),
            ItemField::InfoHash => item.info_hash = Some(text),
            ItemField::Size => item.size = Some(text),
        }
    }
}

fn feed_error(reason: impl std::fmt::Display) -> SearchError {
    SearchError::parse(SourceId::NyaaRss, "feed", reason)
}
