pub mod defs;
pub mod state;

pub use defs::{ChatMessage, ParsedArticle, Role, Sentiment, SentimentLabel, Signal};
pub use state::{CacheStore, cache_key};
