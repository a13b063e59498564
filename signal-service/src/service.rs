use crate::fetcher::GoogleNews;
use crate::llm_adapter::OpenAiChat;
use crate::news::NewsRetriever;
use crate::sentiment::SentimentClassifier;
use crate::summarizer::Summarizer;
use crate::traits::{ChatModel, NewsSource};
use crate::types::{ParsedArticle, Result, Sentiment, ServiceConfig, Signal, SignalError};
use chrono::{Local, NaiveDate, Utc};
use interfaces::state::CacheStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Sentiment of one entity on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub entity: String,
    pub date: NaiveDate,
    pub articles: usize,
    pub sentiment: Sentiment,
    pub action: i8,
}

/// Retrieval and classification wired together: the whole path from an
/// identifier to a trading signal.
pub struct SignalService {
    retriever: NewsRetriever,
    classifier: SentimentClassifier,
    caches: [CacheStore; 2],
}

impl SignalService {
    pub fn new(
        source: Arc<dyn NewsSource>,
        model: Arc<dyn ChatModel>,
        news_cache: CacheStore,
        llm_cache: CacheStore,
        config: &ServiceConfig,
    ) -> Self {
        let retriever = NewsRetriever::new(source, news_cache.clone(), config.retriever.clone());
        let summarizer = Summarizer::new(model.clone(), llm_cache.clone(), config.summarizer.clone());
        let classifier =
            SentimentClassifier::new(summarizer, model, llm_cache.clone(), config.classifier.clone());

        Self {
            retriever,
            classifier,
            caches: [news_cache, llm_cache],
        }
    }

    /// Production wiring: Google News, an OpenAI-compatible model and
    /// SQLite caches under `config.cache_dir`.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        let source = Arc::new(GoogleNews::new(config.news.clone())?);
        let model = Arc::new(OpenAiChat::new(config.llm.clone())?);

        let news_cache = CacheStore::open(config.news_cache_path()).await?;
        let llm_cache = CacheStore::open(config.llm_cache_path()).await?;
        info!(
            "Using caches {} and {}",
            config.news_cache_path().display(),
            config.llm_cache_path().display()
        );

        Ok(Self::new(source, model, news_cache, llm_cache, config))
    }

    pub fn retriever(&self) -> &NewsRetriever {
        &self.retriever
    }

    pub fn classifier(&self) -> &SentimentClassifier {
        &self.classifier
    }

    /// The news cache followed by the model cache
    pub fn caches(&self) -> &[CacheStore] {
        &self.caches
    }

    pub async fn analyze(&self, entity: &str, date: NaiveDate) -> Result<DailySentiment> {
        let articles = self.retriever.get_news(entity, date).await?;
        let sentiment = self
            .classifier
            .get_company_sentiment(entity, &articles, date)
            .await?;

        Ok(DailySentiment {
            entity: entity.to_string(),
            date,
            articles: articles.len(),
            sentiment,
            action: sentiment.action(),
        })
    }

    /// Sentiment of articles supplied as plain `url`/`title`/`text` records
    /// instead of being searched for. Incomplete records are skipped.
    pub async fn classify_records(
        &self,
        entity: &str,
        date: NaiveDate,
        records: &[HashMap<String, String>],
    ) -> Result<DailySentiment> {
        let articles: Vec<ParsedArticle> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let article = ParsedArticle::from_fields(record);
                if article.is_none() {
                    warn!("Skipping record {}: needs url, title and text", index);
                }
                article
            })
            .collect();

        let sentiment = self
            .classifier
            .get_company_sentiment(entity, &articles, date)
            .await?;

        Ok(DailySentiment {
            entity: entity.to_string(),
            date,
            articles: articles.len(),
            sentiment,
            action: sentiment.action(),
        })
    }

    /// Day-by-day analysis over the inclusive range `from..=until`.
    pub async fn analyze_range(
        &self,
        entity: &str,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<DailySentiment>> {
        if until < from {
            return Err(SignalError::General(format!(
                "Range end {} is before its start {}",
                until, from
            )));
        }

        let mut days = Vec::new();
        for date in from.iter_days().take_while(|date| *date <= until) {
            days.push(self.analyze(entity, date).await?);
        }
        Ok(days)
    }

    pub async fn signal_for(&self, identifier: &str, date: NaiveDate) -> Result<Signal> {
        let day = self.analyze(identifier, date).await?;
        info!(
            "Signal for {} on {}: {} -> {}",
            identifier, date, day.sentiment, day.action
        );
        Ok(Signal::from_sentiment(identifier, day.sentiment, unix_timestamp()))
    }

    /// Signal computed from today's news
    pub async fn latest_signal(&self, identifier: &str) -> Result<Signal> {
        let today = Local::now().date_naive();
        self.signal_for(identifier, today).await
    }
}

fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
