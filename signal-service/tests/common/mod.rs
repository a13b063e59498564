#![allow(dead_code)]

use async_trait::async_trait;
use interfaces::state::CacheStore;
use signal_service::{
    ChatMessage, ChatModel, CompletionRequest, NewsQuery, NewsSource, ParsedArticle, Result,
    RetryPolicy, Role, SearchHit, ServiceConfig, SignalError, SignalService,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
}

/// Defaults with every wait removed
pub fn fast_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.retriever.resolve_retry = RetryPolicy::immediate(5);
    config.retriever.article_retry = RetryPolicy::immediate(5);
    config.retriever.article_interval = Duration::ZERO;
    config.summarizer.retry = RetryPolicy::immediate(3);
    config.summarizer.call_interval = Duration::ZERO;
    config.classifier.retry = RetryPolicy::immediate(3);
    config.classifier.invalid_answer_pause = Duration::ZERO;
    config
}

pub async fn build_service(
    source: Arc<MockNewsSource>,
    model: Arc<ScriptedModel>,
    config: &ServiceConfig,
) -> SignalService {
    let news_cache = CacheStore::in_memory("news-cache").await.unwrap();
    let llm_cache = CacheStore::in_memory("gpt-cache").await.unwrap();
    SignalService::new(source, model, news_cache, llm_cache, config)
}

pub fn hit(url: &str) -> SearchHit {
    SearchHit {
        url: url.to_string(),
        title: format!("Headline for {url}"),
        publisher: None,
        published_at: None,
    }
}

pub fn article(url: &str, text: &str) -> ParsedArticle {
    ParsedArticle::new(url, format!("Headline for {url}"), text)
}

/// In-process news provider with call counters
#[derive(Default)]
pub struct MockNewsSource {
    pub hits: Vec<SearchHit>,
    pub fail_search: bool,
    /// Hits whose direct fetch never connects
    pub unreachable: HashSet<String>,
    /// Hit URL -> URL the redirects end at
    pub redirects: HashMap<String, String>,
    /// URL -> page body; URLs not listed have no readable article. Titles
    /// come from the hit, as with a real provider.
    pub articles: HashMap<String, ParsedArticle>,
    /// URLs whose download always fails
    pub broken: HashSet<String>,
    pub searches: AtomicUsize,
    pub resolves: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl MockNewsSource {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One hit per article, each resolving to the article's own URL
    pub fn with_articles(articles: Vec<ParsedArticle>) -> Self {
        let mut source = Self::default();
        for article in articles {
            source.hits.push(hit(&article.url));
            source.articles.insert(article.url.clone(), article);
        }
        source
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn resolves(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    fn source_name(&self) -> String {
        "mock news".to_string()
    }

    async fn search(&self, query: &NewsQuery) -> Result<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(SignalError::Provider {
                status: 503,
                message: "search unavailable".to_string(),
            });
        }
        Ok(self.hits.iter().take(query.max_results).cloned().collect())
    }

    async fn resolve(&self, hit: &SearchHit) -> Result<String> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.contains(&hit.url) {
            return Err(SignalError::General(format!("connection refused: {}", hit.url)));
        }
        Ok(self.redirects.get(&hit.url).cloned().unwrap_or_else(|| hit.url.clone()))
    }

    async fn fetch_article(&self, url: &str, title: &str) -> Result<Option<ParsedArticle>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.broken.contains(url) {
            return Err(SignalError::General(format!("download failed: {url}")));
        }
        Ok(self
            .articles
            .get(url)
            .map(|article| ParsedArticle::new(url, title, article.text.as_str())))
    }
}

/// Language model that summarizes by echoing and answers sentiment requests
/// from a script. The last scripted answer repeats forever.
pub struct ScriptedModel {
    sentiment_answers: Vec<String>,
    /// Number of leading calls (of any kind) that fail at the transport level
    failing_calls: AtomicUsize,
    pub summary_calls: AtomicUsize,
    pub sentiment_calls: AtomicUsize,
    summary_requests: Mutex<Vec<CompletionRequest>>,
    sentiment_requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn answering(answers: &[&str]) -> Self {
        Self {
            sentiment_answers: answers.iter().map(|a| a.to_string()).collect(),
            failing_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            sentiment_calls: AtomicUsize::new(0),
            summary_requests: Mutex::new(Vec::new()),
            sentiment_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_first(self, calls: usize) -> Self {
        self.failing_calls.store(calls, Ordering::SeqCst);
        self
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn sentiment_calls(&self) -> usize {
        self.sentiment_calls.load(Ordering::SeqCst)
    }

    pub fn last_sentiment_request(&self) -> Vec<ChatMessage> {
        self.sentiment_requests
            .lock()
            .unwrap()
            .last()
            .map(|request| request.messages.clone())
            .unwrap_or_default()
    }

    pub fn summary_requests(&self) -> Vec<CompletionRequest> {
        self.summary_requests.lock().unwrap().clone()
    }

    pub fn sentiment_requests(&self) -> Vec<CompletionRequest> {
        self.sentiment_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_name(&self) -> String {
        "scripted".to_string()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let failing = self
            .failing_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SignalError::Provider {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }

        let is_sentiment = request
            .messages
            .first()
            .map(|message| message.role == Role::System)
            .unwrap_or(false);

        if is_sentiment {
            let n = self.sentiment_calls.fetch_add(1, Ordering::SeqCst);
            self.sentiment_requests.lock().unwrap().push(request.clone());
            let answer = self
                .sentiment_answers
                .get(n)
                .or_else(|| self.sentiment_answers.last())
                .cloned()
                .unwrap_or_default();
            Ok(answer)
        } else {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            self.summary_requests.lock().unwrap().push(request.clone());
            let text = request.messages.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(format!("Summary: {text}"))
        }
    }
}
