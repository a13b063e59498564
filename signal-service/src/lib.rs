pub mod api;
pub mod fetcher;
pub mod llm_adapter;
pub mod news;
pub mod pacing;
pub mod parser;
pub mod prompts;
pub mod retry;
pub mod sentiment;
pub mod service;
pub mod summarizer;
pub mod traits;
pub mod types;

pub use fetcher::GoogleNews;
pub use llm_adapter::OpenAiChat;
pub use news::NewsRetriever;
pub use pacing::Pacer;
pub use parser::FeedParser;
pub use retry::RetryPolicy;
pub use sentiment::SentimentClassifier;
pub use service::{DailySentiment, SignalService};
pub use summarizer::Summarizer;
pub use traits::{ChatModel, CompletionRequest, DateWindow, NewsQuery, NewsSource, SearchHit};
pub use types::*;
