use crate::retry::RetryPolicy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Shared model types live in the interfaces crate
pub use interfaces::defs::{ChatMessage, ParsedArticle, Role, Sentiment, SentimentLabel, Signal};

#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub search_url: String,
    pub language: String,
    pub country: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_redirects: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            search_url: "https://news.google.com/rss/search".to_string(),
            language: "en".to_string(),
            country: "US".to_string(),
            user_agent: "Mozilla/5.0 (compatible; SignalService/1.0)".to_string(),
            timeout_seconds: 30,
            max_redirects: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo-16k".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub max_results: usize,
    /// Direct fetch that gets past consent interstitials
    pub resolve_retry: RetryPolicy,
    pub article_retry: RetryPolicy,
    /// Minimum spacing between full-article downloads
    pub article_interval: Duration,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            resolve_retry: RetryPolicy::new(5, Duration::from_secs(2), 2.0),
            article_retry: RetryPolicy::new(5, Duration::from_secs(1), 2.0),
            article_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub max_tokens: u32,
    pub retry: RetryPolicy,
    pub call_interval: Duration,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            retry: RetryPolicy::model_default(),
            call_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub max_tokens: u32,
    pub retry: RetryPolicy,
    /// Extra rounds after the first one when the model answers with
    /// something other than a sentiment label
    pub invalid_answer_retries: u32,
    pub invalid_answer_pause: Duration,
    /// Whether an exhausted classification (`ERROR`) is memoized like a
    /// real answer. When false the next call for the same inputs tries again.
    pub cache_failures: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            retry: RetryPolicy::model_default(),
            invalid_answer_retries: 3,
            invalid_answer_pause: Duration::from_secs(2),
            cache_failures: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub retriever: RetrieverConfig,
    pub summarizer: SummarizerConfig,
    pub classifier: ClassifierConfig,
    pub cache_dir: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            news: NewsConfig::default(),
            llm: LlmConfig::default(),
            retriever: RetrieverConfig::default(),
            summarizer: SummarizerConfig::default(),
            classifier: ClassifierConfig::default(),
            cache_dir: PathBuf::from("."),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by environment variables. A missing model
    /// credential is left empty; requests then fail at the provider.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.llm.api_key = env::var("OPEN_API_TOKEN").unwrap_or_default();
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            config.llm.base_url = base_url;
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.llm.model = model;
        }
        if let Ok(search_url) = env::var("GOOGLE_NEWS_URL") {
            config.news.search_url = search_url;
        }
        if let Ok(cache_dir) = env::var("SIGNAL_CACHE_DIR") {
            config.cache_dir = PathBuf::from(cache_dir);
        }

        config
    }

    pub fn news_cache_path(&self) -> PathBuf {
        self.cache_dir.join("news-cache.db")
    }

    pub fn llm_cache_path(&self) -> PathBuf {
        self.cache_dir.join("gpt-cache.db")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("Article extraction failed for {url}: {message}")]
    Extraction { url: String, message: String },

    #[error("Cache error: {0}")]
    Cache(#[from] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, SignalError>;
