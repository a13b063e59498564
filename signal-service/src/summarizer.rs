use crate::pacing::Pacer;
use crate::prompts;
use crate::traits::{ChatModel, CompletionRequest};
use crate::types::{ParsedArticle, Result, SummarizerConfig};
use chrono::NaiveDate;
use interfaces::state::CacheStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Entity-focused article summaries from the language model
pub struct Summarizer {
    model: Arc<dyn ChatModel>,
    cache: CacheStore,
    pacer: Pacer,
    config: SummarizerConfig,
}

impl Summarizer {
    pub fn new(model: Arc<dyn ChatModel>, cache: CacheStore, config: SummarizerConfig) -> Self {
        let pacer = Pacer::new(config.call_interval);
        Self {
            model,
            cache,
            pacer,
            config,
        }
    }

    /// Summary of one article, memoized per (entity, date, article).
    pub async fn create_article_summary(
        &self,
        entity: &str,
        date: NaiveDate,
        article: &ParsedArticle,
    ) -> Result<String> {
        self.cache
            .get_or_compute(
                "create_article_summary",
                &(entity, date, article),
                |_| true,
                || async {
                    self.pacer.until_ready().await;
                    let request = CompletionRequest::new(
                        prompts::article_summary_messages(entity, date, article),
                        self.config.max_tokens,
                    );
                    self.config
                        .retry
                        .run("Article summary", || self.model.complete(&request))
                        .await
                },
            )
            .await
    }

    /// Summaries in article order, one model call at a time.
    pub async fn create_summaries(
        &self,
        entity: &str,
        date: NaiveDate,
        articles: &[ParsedArticle],
    ) -> Result<Vec<String>> {
        info!("Creating summaries for {} articles about {}", articles.len(), entity);

        let mut summaries = Vec::with_capacity(articles.len());
        for (index, article) in articles.iter().enumerate() {
            debug!("Summarizing article {}/{}: {}", index + 1, articles.len(), article);
            summaries.push(self.create_article_summary(entity, date, article).await?);
        }
        Ok(summaries)
    }
}
