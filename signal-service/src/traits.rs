use crate::types::{ChatMessage, ParsedArticle, Result};
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Half-open publication window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The single calendar day starting at `date`
    pub fn day(date: NaiveDate) -> Self {
        let end = date.checked_add_days(Days::new(1)).unwrap_or(date);
        Self { start: date, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub entity: String,
    pub window: DateWindow,
    pub max_results: usize,
}

/// A search result before its article has been downloaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub publisher: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// News search-and-scrape provider
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn source_name(&self) -> String;

    /// Search for articles about the query entity in its window.
    /// A provider with nothing to report returns an empty list.
    async fn search(&self, query: &NewsQuery) -> Result<Vec<SearchHit>>;

    /// Fetch the hit directly, following redirects past any consent page,
    /// and return the URL the article actually lives at.
    async fn resolve(&self, hit: &SearchHit) -> Result<String>;

    /// Download and extract the full article found at `url`. The headline
    /// comes from the search hit. `None` when the page holds no readable
    /// article body.
    async fn fetch_article(&self, url: &str, title: &str) -> Result<Option<ParsedArticle>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Deterministic request (temperature 0)
    pub fn new(messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            messages,
            max_tokens,
            temperature: 0.0,
        }
    }
}

/// Chat-completion language model returning a single candidate
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> String;

    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
