use crate::prompts;
use crate::summarizer::Summarizer;
use crate::traits::{ChatModel, CompletionRequest};
use crate::types::{ClassifierConfig, ParsedArticle, Result, Sentiment, SentimentLabel};
use chrono::NaiveDate;
use interfaces::state::CacheStore;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Aggregates article summaries into a single sentiment label
pub struct SentimentClassifier {
    summarizer: Summarizer,
    model: Arc<dyn ChatModel>,
    cache: CacheStore,
    config: ClassifierConfig,
}

impl SentimentClassifier {
    pub fn new(
        summarizer: Summarizer,
        model: Arc<dyn ChatModel>,
        cache: CacheStore,
        config: ClassifierConfig,
    ) -> Self {
        Self {
            summarizer,
            model,
            cache,
            config,
        }
    }

    /// Sentiment of the day's articles for `entity`, memoized per
    /// (entity, articles, date). `Sentiment::Error` is only memoized when
    /// `cache_failures` is set.
    pub async fn get_company_sentiment(
        &self,
        entity: &str,
        articles: &[ParsedArticle],
        date: NaiveDate,
    ) -> Result<Sentiment> {
        let cache_failures = self.config.cache_failures;
        let sentiment = self
            .cache
            .get_or_compute(
                "get_company_sentiment",
                &(entity, articles, date),
                |sentiment: &Sentiment| cache_failures || !sentiment.is_error(),
                || self.classify_with_retries(entity, articles, date),
            )
            .await?;

        if sentiment.is_error() && !cache_failures {
            warn!(
                "{} sentiment for {} on {} left out of the cache, the next request classifies again",
                sentiment, entity, date
            );
        }
        Ok(sentiment)
    }

    async fn classify_with_retries(
        &self,
        entity: &str,
        articles: &[ParsedArticle],
        date: NaiveDate,
    ) -> Result<Sentiment> {
        let attempts = self.config.invalid_answer_retries + 1;

        for attempt in 1..=attempts {
            if let Some(label) = self.classify_once(entity, articles, date).await? {
                return Ok(Sentiment::Label(label));
            }
            if attempt < attempts {
                warn!("Number of retries left: {}", attempts - attempt);
                tokio::time::sleep(self.config.invalid_answer_pause).await;
            }
        }

        error!(
            "No valid sentiment for {} on {} after {} attempts, finished with error",
            entity, date, attempts
        );
        Ok(Sentiment::Error)
    }

    /// One summarize-and-classify round. `None` when the model's answer is
    /// not a sentiment label.
    async fn classify_once(
        &self,
        entity: &str,
        articles: &[ParsedArticle],
        date: NaiveDate,
    ) -> Result<Option<SentimentLabel>> {
        let summaries = self.summarizer.create_summaries(entity, date, articles).await?;
        if let Some(tokens) = prompts::token_count(&summaries) {
            info!("Number of tokens in article summaries: {}", tokens);
        }

        let request = CompletionRequest::new(
            prompts::sentiment_messages(entity, date, &summaries),
            self.config.max_tokens,
        );
        let response = self
            .config
            .retry
            .run("Sentiment request", || self.model.complete(&request))
            .await?;

        match SentimentLabel::parse_response(&response) {
            Some(label) => {
                info!("Sentiment for {} on {}: {}", entity, date, label);
                Ok(Some(label))
            }
            None => {
                warn!("Invalid response from {}: {:?}", self.model.model_name(), response);
                Ok(None)
            }
        }
    }
}
