use crate::pacing::Pacer;
use crate::traits::{DateWindow, NewsQuery, NewsSource, SearchHit};
use crate::types::{ParsedArticle, Result, RetrieverConfig};
use chrono::NaiveDate;
use interfaces::state::CacheStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Finds and downloads the news published about an entity on one day.
pub struct NewsRetriever {
    source: Arc<dyn NewsSource>,
    cache: CacheStore,
    pacer: Pacer,
    config: RetrieverConfig,
}

impl NewsRetriever {
    pub fn new(source: Arc<dyn NewsSource>, cache: CacheStore, config: RetrieverConfig) -> Self {
        let pacer = Pacer::new(config.article_interval);
        Self {
            source,
            cache,
            pacer,
            config,
        }
    }

    /// Articles about `entity` published on `date`, memoized per (entity, date).
    /// Candidates that cannot be reached or parsed are left out; only a
    /// failing search is an error.
    pub async fn get_news(&self, entity: &str, date: NaiveDate) -> Result<Vec<ParsedArticle>> {
        self.cache
            .get_or_compute("get_news", &(entity, date), |_| true, || self.download(entity, date))
            .await
    }

    async fn download(&self, entity: &str, date: NaiveDate) -> Result<Vec<ParsedArticle>> {
        let query = NewsQuery {
            entity: entity.to_string(),
            window: DateWindow::day(date),
            max_results: self.config.max_results,
        };

        let mut hits = self.source.search(&query).await?;
        if hits.is_empty() {
            info!("No news found for {} on {}", entity, date);
            return Ok(Vec::new());
        }
        hits.truncate(self.config.max_results);

        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for hit in &hits {
            let Some(url) = self.resolve(hit).await else {
                continue;
            };
            if seen.insert(url.clone()) {
                resolved.push((url, hit));
            } else {
                debug!("Skipping duplicate article {}", url);
            }
        }

        let mut articles = Vec::with_capacity(resolved.len());
        for (index, (url, hit)) in resolved.iter().enumerate() {
            self.pacer.until_ready().await;
            debug!("Downloading and parsing article {}/{}: {}", index + 1, resolved.len(), url);
            if let Some(article) = self.fetch_article(url, &hit.title).await {
                articles.push(article);
            }
        }

        info!(
            "Retrieved {} articles for {} on {} from {} search results ({})",
            articles.len(),
            entity,
            date,
            hits.len(),
            self.source.source_name()
        );
        Ok(articles)
    }

    async fn resolve(&self, hit: &SearchHit) -> Option<String> {
        match self
            .config
            .resolve_retry
            .run("Direct article fetch", || self.source.resolve(hit))
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Connection error for {}, skipping: {}", hit.url, e);
                None
            }
        }
    }

    async fn fetch_article(&self, url: &str, title: &str) -> Option<ParsedArticle> {
        match self
            .config
            .article_retry
            .run("Full article download", || self.source.fetch_article(url, title))
            .await
        {
            Ok(Some(article)) => Some(article),
            Ok(None) => {
                debug!("No article could be parsed from {}", url);
                None
            }
            Err(e) => {
                warn!("Giving up on article {}: {}", url, e);
                None
            }
        }
    }
}
