use crate::parser::FeedParser;
use crate::traits::{NewsQuery, NewsSource, SearchHit};
use crate::types::{NewsConfig, ParsedArticle, Result, SignalError};
use async_trait::async_trait;
use llm_readability::extractor;
use reqwest::Client;
use std::io::Cursor;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

/// Google News RSS search plus direct article download and extraction.
pub struct GoogleNews {
    client: Client,
    config: NewsConfig,
}

impl GoogleNews {
    pub fn new(config: NewsConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Search URL for the query. The date window is expressed with the
    /// `after:`/`before:` search operators.
    pub fn search_url(&self, query: &NewsQuery) -> Result<Url> {
        let q = format!(
            "{} after:{} before:{}",
            query.entity,
            query.window.start.format("%Y-%m-%d"),
            query.window.end.format("%Y-%m-%d")
        );
        let ceid = format!("{}:{}", self.config.country, self.config.language);
        let url = Url::parse_with_params(
            &self.config.search_url,
            &[
                ("q", q.as_str()),
                ("hl", self.config.language.as_str()),
                ("gl", self.config.country.as_str()),
                ("ceid", ceid.as_str()),
            ],
        )?;
        Ok(url)
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SignalError::Provider {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content = response.text().await?;
        debug!(
            "Fetched {} ({} bytes in {}ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }
}

#[async_trait]
impl NewsSource for GoogleNews {
    fn source_name(&self) -> String {
        "Google News".to_string()
    }

    async fn search(&self, query: &NewsQuery) -> Result<Vec<SearchHit>> {
        let url = self.search_url(query)?;
        info!("Searching news for {} ({} to {})", query.entity, query.window.start, query.window.end);

        let content = self.fetch_text(url.as_str()).await?;
        let hits = FeedParser::new().parse_search_results(&content, query.max_results)?;

        info!("Search returned {} results for {}", hits.len(), query.entity);
        Ok(hits)
    }

    async fn resolve(&self, hit: &SearchHit) -> Result<String> {
        // Status is irrelevant here, only where the redirects end up
        let response = self.client.get(&hit.url).send().await?;
        let resolved = response.url().to_string();
        if resolved != hit.url {
            debug!("Resolved {} to {}", hit.url, resolved);
        }
        Ok(resolved)
    }

    async fn fetch_article(&self, url: &str, title: &str) -> Result<Option<ParsedArticle>> {
        let html = self.fetch_text(url).await?;
        extract_article(url, title, &html)
    }
}

/// Pulls the readable body out of an article page and pairs it with the
/// headline. Pages without any body text give `None`.
pub fn extract_article(url: &str, title: &str, html: &str) -> Result<Option<ParsedArticle>> {
    let parsed_url = Url::parse(url)?;
    let mut cursor = Cursor::new(html.as_bytes());
    let product = extractor::extract(&mut cursor, &parsed_url).map_err(|e| SignalError::Extraction {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let text = product.text.trim();
    if text.is_empty() {
        debug!("No readable text in {}", url);
        return Ok(None);
    }

    Ok(Some(ParsedArticle::new(url, title.trim(), text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::DateWindow;
    use chrono::NaiveDate;

    #[test]
    fn search_url_carries_the_day_window() {
        let news = GoogleNews::new(NewsConfig::default()).unwrap();
        let query = NewsQuery {
            entity: "Apple Inc".to_string(),
            window: DateWindow::day(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()),
            max_results: 10,
        };

        let url = news.search_url(&query).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("news.google.com"));
        assert!(pairs.contains(&("q".to_string(), "Apple Inc after:2024-01-31 before:2024-02-01".to_string())));
        assert!(pairs.contains(&("hl".to_string(), "en".to_string())));
        assert!(pairs.contains(&("gl".to_string(), "US".to_string())));
        assert!(pairs.contains(&("ceid".to_string(), "US:en".to_string())));
    }
}
