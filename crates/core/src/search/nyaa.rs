//! Paginated HTML scraper for the nyaa.si index.
//!
//! Walks result pages starting at page 1 until the index serves the empty
//! table marker. The page structure is fixed: one results table whose rows
//! carry category, title, download links, size and release time cells.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::fetch::{FetchOptions, Fetcher};

use super::timefmt;
use super::{SearchError, SearchOptions, Source, SourceId, Torrent};

const BASE_URL: &str = "https://nyaa.si/";
/// Fixed category filter: all anime.
const CATEGORY: &str = "1_0";
/// Timestamp pattern used in the release-time cell.
const NATIVE_TIMEFMT: &str = "%Y-%m-%d %H:%M";

/// Paginated HTML search source.
pub struct NyaaSource {
    fetcher: Arc<dyn Fetcher>,
    verify_tls: bool,
    timefmt: String,
    max_pages: u32,
}

impl NyaaSource {
    /// Create a source bound to the given configuration and transport.
    pub fn new(config: &SearchConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        if let Some(parser) = config.parser.as_deref() {
            if parser != "html5ever" {
                warn!(
                    parser,
                    "unknown html parser backend, falling back to html5ever"
                );
            }
        }

        Self {
            fetcher,
            verify_tls: config.verify_tls,
            timefmt: config.timefmt.clone(),
            max_pages: config.max_pages,
        }
    }

    /// Build the query URL for one results page.
    fn build_page_url(&self, keyword: &str, extra_params: &[(String, String)], page: u32) -> String {
        let mut url = format!(
            "{}?q={}&c={}",
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

        url.push_str(&format!("&p={}", page));
        url
    }
}

#[async_trait]
impl Source for NyaaSource {
    fn id(&self) -> SourceId {
        SourceId::Nyaa
    }

    async fn search(
        &self,
        keyword: &str,
        opts: &SearchOptions,
    ) -> Result<Option<Vec<Torrent>>, SearchError> {
        if opts.collected {
            warn!(
                source = %self.id(),
                "collected search is not supported, searching the public index"
            );
        }

        let fetch_opts = FetchOptions {
            verify_tls: self.verify_tls,
            proxies: opts.proxies.clone(),
            use_system_proxy: opts.use_system_proxy,
        };

        let mut torrents = Vec::new();
        let mut page = 1u32;

        loop {
            if page > self.max_pages {
                warn!(
                    source = %self.id(),
                    max_pages = self.max_pages,
                    "page cap reached before the index signaled an empty page"
                );
                break;
            }

            let url = self.build_page_url(keyword, &opts.extra_params, page);
            debug!(source = %self.id(), page, "fetching results page");

            let html = self.fetcher.fetch_text(&url, &fetch_opts).await?;

            match parse_results_page(&html, &self.timefmt, page)? {
                Some(mut rows) => {
                    debug!(source = %self.id(), page, rows = rows.len(), "parsed results page");
                    torrents.append(&mut rows);
                }
                // Empty page: terminal success, not an error.
                None => break,
            }

            page += 1;
        }

        Ok(Some(torrents))
    }
}

/// Parse one results page.
///
/// Returns `None` when the page carries the empty-state marker: no table body
/// at all, or a body without result rows. Any row deviating from the expected
/// shape fails the whole invocation; partial pages are not salvaged.
fn parse_results_page(
    html: &str,
    timefmt: &str,
    page: u32,
) -> Result<Option<Vec<Torrent>>, SearchError> {
    let document = Html::parse_document(html);

    let tbody_sel = selector("tbody", page)?;
    let row_sel = selector("tr", page)?;
    let cell_sel = selector("td", page)?;
    let anchor_sel = selector("a", page)?;

    let Some(tbody) = document.select(&tbody_sel).next() else {
        return Ok(None);
    };

    let rows: Vec<ElementRef> = tbody.select(&row_sel).collect();
    if rows.is_empty() {
        return Ok(None);
    }

    let mut torrents = Vec::with_capacity(rows.len());
    for row in rows {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        // Layout: category, title, links, size, release time, trailing stats.
        if cells.len() < 5 {
            return Err(parse_error(
                page,
                format!("expected at least 5 cells per result row, found {}", cells.len()),
            ));
        }

        let title = cells[1]
            .select(&anchor_sel)
            .next()
            .and_then(|a| a.value().attr("title"))
            .ok_or_else(|| parse_error(page, "result row without a titled anchor"))?
            .to_string();

        let magnet = cells[2]
            .select(&anchor_sel)
            .nth(1)
            .and_then(|a| a.value().attr("href"))
            .ok_or_else(|| parse_error(page, "result row without a magnet anchor"))?
            .to_string();

        let size = cells[3].text().collect::<String>().trim().to_string();

        let raw_time = cells[4].text().collect::<String>();
        let release_time = timefmt::reformat_naive(&raw_time, NATIVE_TIMEFMT, timefmt)
            .map_err(|e| {
                parse_error(page, format!("malformed release time {:?}: {}", raw_time.trim(), e))
            })?;

        debug!(title = %title, "parsed result row");

        torrents.push(Torrent {
            release_time,
            title,
            size,
            magnet: Some(magnet),
            torrent_url: None,
            info_hash: None,
        });
    }

    Ok(Some(torrents))
}

fn selector(css: &str, page: u32) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| parse_error(page, format!("invalid selector {css:?}: {e:?}")))
}

fn parse_error(page: u32, reason: impl std::fmt::Display) -> SearchError {
    SearchError::parse(SourceId::Nyaa, format!("results page {page}"), reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFetcher;

    fn source_with(fetcher: Arc<MockFetcher>, max_pages: u32) -> NyaaSource {
        let config = SearchConfig {
            max_pages,
            ..SearchConfig::default()
        };
        NyaaSource::new(&config, fetcher)
    }

    /// One result row in the index's table layout.
    fn row_html(title: &str, magnet: &str, size: &str, time: &str) -> String {
        format!(
            r#"<tr class="default">
  <td><a href="/?c=1_2"><img src="/static/img/icons/nyaa/1_2.png" alt="Anime"></a></td>
  <td colspan="2"><a href="/view/1" title="{title}">{title}</a></td>
  <td class="text-center">
    <a href="/download/1.torrent"><i class="fa fa-download"></i></a>
    <a href="{magnet}"><i class="fa fa-magnet"></i></a>
  </td>
  <td class="text-center">{size}</td>
  <td class="text-center">{time}</td>
  <td class="text-center">12</td>
  <td class="text-center">3</td>
</tr>"#
        )
    }

    fn page_html(rows: &[String]) -> String {
        format!(
            "<html><body><table class=\"table\"><tbody>{}</tbody></table></body></html>",
            rows.join("\n")
        )
    }

    fn empty_page_html() -> String {
        "<html><body><table class=\"table\"><tbody>\n</tbody></table></body></html>".to_string()
    }

    #[test]
    fn test_build_page_url() {
        let source = source_with(Arc::new(MockFetcher::new()), 100);
        let url = source.build_page_url("some show", &[], 3);
        assert!(url.starts_with("https://nyaa.si/?q=some%20show&c=1_0"));
        assert!(url.ends_with("&p=3"));
    }

    #[test]
    fn test_build_page_url_forwards_extra_params_verbatim() {
        let source = source_with(Arc::new(MockFetcher::new()), 100);
        let extra = vec![
            ("f".to_string(), "2".to_string()),
            ("s".to_string(), "seeders".to_string()),
        ];
        let url = source.build_page_url("show", &extra, 1);
        assert!(url.contains("&f=2"));
        assert!(url.contains("&s=seeders"));
    }

    #[test]
    fn test_parse_results_page_extracts_rows() {
        let html = page_html(&[
            row_html(
                "[Group] Show - 01",
                "magnet:?xt=urn:btih:aaa",
                "1.2 GiB",
                "2024-06-15 10:30",
            ),
            row_html(
                "[Group] Show - 02",
                "magnet:?xt=urn:btih:bbb",
                "700.5 MiB",
                "2024-06-16 09:00",
            ),
        ]);

        let torrents = parse_results_page(&html, timefmt::DEFAULT_TIMEFMT, 1)
            .unwrap()
            .unwrap();

        assert_eq!(torrents.len(), 2);
        assert_eq!(torrents[0].title, "[Group] Show - 01");
        assert_eq!(torrents[0].magnet.as_deref(), Some("magnet:?xt=urn:btih:aaa"));
        assert_eq!(torrents[0].size, "1.2 GiB");
        assert_eq!(torrents[0].release_time, "2024/06/15 10:30");
        assert!(torrents[0].torrent_url.is_none());
        assert!(torrents[0].info_hash.is_none());
        // Row order within the page is preserved.
        assert_eq!(torrents[1].title, "[Group] Show - 02");
    }

    #[test]
    fn test_parse_results_page_empty_body_is_terminal() {
        let parsed = parse_results_page(&empty_page_html(), timefmt::DEFAULT_TIMEFMT, 1).unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_results_page_missing_body_is_terminal() {
        let parsed =
            parse_results_page("<html><body>nothing here</body></html>", timefmt::DEFAULT_TIMEFMT, 1)
                .unwrap();
        assert!(parsed.is_none());
    }

    #[test]
    fn test_parse_results_page_missing_magnet_fails() {
        let row = r#"<tr>
  <td>cat</td>
  <td><a href="/view/1" title="t">t</a></td>
  <td><a href="/download/1.torrent">dl</a></td>
  <td>1 GiB</td>
  <td>2024-06-15 10:30</td>
</tr>"#;
        let html = page_html(&[row.to_string()]);
        let err = parse_results_page(&html, timefmt::DEFAULT_TIMEFMT, 2).unwrap_err();
        assert!(matches!(err, SearchError::Parse { .. }));
        assert!(err.to_string().contains("results page 2"));
    }

    #[test]
    fn test_parse_results_page_malformed_date_fails() {
        let html = page_html(&[row_html(
            "title",
            "magnet:?xt=urn:btih:aaa",
            "1 GiB",
            "soon",
        )]);
        let err = parse_results_page(&html, timefmt::DEFAULT_TIMEFMT, 1).unwrap_err();
        assert!(matches!(err, SearchError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_search_stops_at_empty_page() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .push_response(page_html(&[
                row_html("ep 1", "magnet:?xt=urn:btih:a", "1 GiB", "2024-06-15 10:30"),
                row_html("ep 2", "magnet:?xt=urn:btih:b", "1 GiB", "2024-06-15 11:30"),
            ]))
            .await;
        fetcher
            .push_response(page_html(&[row_html(
                "ep 3",
                "magnet:?xt=urn:btih:c",
                "1 GiB",
                "2024-06-15 12:30",
            )]))
            .await;
        fetcher.push_response(empty_page_html()).await;

        let source = source_with(Arc::clone(&fetcher), 100);
        let torrents = source
            .search("show", &SearchOptions::default())
            .await
            .unwrap()
            .unwrap();

        // Page 3 is empty: exactly 3 fetches, union of rows from pages 1-2.
        assert_eq!(fetcher.request_count().await, 3);
        assert_eq!(torrents.len(), 3);
        let titles: Vec<&str> = torrents.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["ep 1", "ep 2", "ep 3"]);

        let requests = fetcher.requests().await;
        assert!(requests[0].url.contains("&p=1"));
        assert!(requests[1].url.contains("&p=2"));
        assert!(requests[2].url.contains("&p=3"));
    }

    #[tokio::test]
    async fn test_search_empty_first_page_yields_zero_hits() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push_response(empty_page_html()).await;

        let source = source_with(Arc::clone(&fetcher), 100);
        let torrents = source
            .search("nope", &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(torrents, Some(Vec::new()));
        assert_eq!(fetcher.request_count().await, 1);
    }

    #[tokio::test]
    async fn test_search_respects_page_cap() {
        let fetcher = Arc::new(MockFetcher::new());
        for i in 0..5 {
            fetcher
                .push_response(page_html(&[row_html(
                    &format!("ep {i}"),
                    "magnet:?xt=urn:btih:x",
                    "1 GiB",
                    "2024-06-15 10:30",
                )]))
                .await;
        }

        let source = source_with(Arc::clone(&fetcher), 2);
        let torrents = source
            .search("show", &SearchOptions::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(fetcher.request_count().await, 2);
        assert_eq!(torrents.len(), 2);
    }

    #[tokio::test]
    async fn test_search_malformed_row_discards_partial_results() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .push_response(page_html(&[row_html(
                "good",
                "magnet:?xt=urn:btih:a",
                "1 GiB",
                "2024-06-15 10:30",
            )]))
            .await;
        fetcher
            .push_response(page_html(&[row_html(
                "bad",
                "magnet:?xt=urn:btih:b",
                "1 GiB",
                "not a date",
            )]))
            .await;

        let source = source_with(Arc::clone(&fetcher), 100);
        let result = source.search("show", &SearchOptions::default()).await;
        assert!(matches!(result, Err(SearchError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_search_propagates_transport_failure() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.set_fail_status(503).await;

        let source = source_with(Arc::clone(&fetcher), 100);
        let result = source.search("show", &SearchOptions::default()).await;
        assert!(matches!(result, Err(SearchError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_search_forwards_transport_options() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push_response(empty_page_html()).await;

        let config = SearchConfig {
            verify_tls: true,
            ..SearchConfig::default()
        };
        let source = NyaaSource::new(&config, fetcher.clone());
        source
            .search("show", &SearchOptions::default())
            .await
            .unwrap();

        let requests = fetcher.requests().await;
        assert!(requests[0].opts.verify_tls);
    }
}
