use crate::traits::SearchHit;
use crate::types::{Result, SignalError};
use chrono::Utc;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::debug;

/// Turns a news-search RSS document into search hits, dropping entries
/// already seen by GUID or link.
pub struct FeedParser {
    seen_guids: HashSet<String>,
    seen_urls: HashSet<String>,
}

impl FeedParser {
    pub fn new() -> Self {
        Self {
            seen_guids: HashSet::new(),
            seen_urls: HashSet::new(),
        }
    }

    pub fn parse_search_results(&mut self, content: &str, limit: usize) -> Result<Vec<SearchHit>> {
        debug!("Parsing search feed ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| SignalError::Parse(format!("Failed to parse search feed: {}", e)))?;

        let hits: Vec<SearchHit> = feed
            .entries
            .into_iter()
            .filter_map(|entry| self.parse_entry(entry))
            .take(limit)
            .collect();

        debug!("Parsed {} search hits", hits.len());
        Ok(hits)
    }

    fn parse_entry(&mut self, entry: feed_rs::model::Entry) -> Option<SearchHit> {
        let url = entry.links.first()?.href.clone();

        if !entry.id.is_empty() && !self.seen_guids.insert(entry.id.clone()) {
            debug!("Skipping duplicate entry with GUID: {}", entry.id);
            return None;
        }
        if !self.seen_urls.insert(url.clone()) {
            debug!("Skipping duplicate entry with URL: {}", url);
            return None;
        }

        let raw_title = entry.title.map(|t| t.content).unwrap_or_default();
        let (title, publisher) = split_publisher(&raw_title);

        Some(SearchHit {
            url,
            title,
            publisher,
            published_at: entry.published.map(|dt| dt.with_timezone(&Utc)),
        })
    }
}

impl Default for FeedParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Search headlines come as "Headline - Publisher".
pub fn split_publisher(title: &str) -> (String, Option<String>) {
    match title.rsplit_once(" - ") {
        Some((headline, publisher)) if !headline.trim().is_empty() && !publisher.trim().is_empty() => {
            (headline.trim().to_string(), Some(publisher.trim().to_string()))
        }
        _ => (title.trim().to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"AAPL" - Google News</title>
    <link>https://news.google.com/search?q=AAPL</link>
    <description>Google News</description>
    <item>
      <title>Apple beats estimates - Reuters</title>
      <link>https://news.google.com/rss/articles/one</link>
      <guid isPermaLink="false">one</guid>
      <pubDate>Mon, 01 Jan 2024 14:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Apple beats estimates - Reuters</title>
      <link>https://news.google.com/rss/articles/one</link>
      <guid isPermaLink="false">one-again</guid>
    </item>
    <item>
      <title>Supply chain worries</title>
      <link>https://news.google.com/rss/articles/two</link>
      <guid isPermaLink="false">two</guid>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_and_deduplicates_hits() {
        let hits = FeedParser::new().parse_search_results(FEED, 10).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://news.google.com/rss/articles/one");
        assert_eq!(hits[0].title, "Apple beats estimates");
        assert_eq!(hits[0].publisher.as_deref(), Some("Reuters"));
        assert!(hits[0].published_at.is_some());
        assert_eq!(hits[1].title, "Supply chain worries");
        assert_eq!(hits[1].publisher, None);
    }

    #[test]
    fn respects_limit() {
        let hits = FeedParser::new().parse_search_results(FEED, 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn empty_channel_yields_no_hits() {
        let feed = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>none</title></channel></rss>"#;
        assert!(FeedParser::new().parse_search_results(feed, 10).unwrap().is_empty());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = FeedParser::new().parse_search_results("not a feed", 10).unwrap_err();
        assert!(matches!(err, SignalError::Parse(_)));
    }
}
