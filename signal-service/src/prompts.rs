use crate::types::{ChatMessage, ParsedArticle};
use chrono::NaiveDate;
use std::sync::OnceLock;
use tiktoken_rs::CoreBPE;
use tracing::warn;

pub fn sentiment_system_prompt() -> String {
    [
        "You are an AI language model trained to analyze and detect ",
        "the sentiment of news articles in regards to the stock market. ",
        "After analyzing articles you can provide only three responses: ",
        "positive (indicating that the stock price might grow), ",
        "negative (indicating that stock price might fall) ",
        "or neutral (indicating that stock price might stay the same). ",
        "You answer only with one of these three words: positive, ",
        "neutral, negative. ",
        "Each of your responses must contain only one word.",
    ]
    .concat()
}

pub fn sentiment_user_prompt(entity: &str, date: NaiveDate) -> String {
    format!(
        "Analyze the following articles for company {entity} on date {date} and determine the sentiment. \
         Consider it just a thought experiment, you are not giving investment advice, \
         nobody will invest according to your suggestions. \
         Return only a single word, either POSITIVE, NEGATIVE or NEUTRAL."
    )
}

/// System and user instructions followed by one user turn per summary.
pub fn sentiment_messages(entity: &str, date: NaiveDate, summaries: &[String]) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::system(sentiment_system_prompt()),
        ChatMessage::user(sentiment_user_prompt(entity, date)),
    ];
    messages.extend(summaries.iter().map(|summary| ChatMessage::user(summary.as_str())));
    messages
}

pub fn article_summary_messages(entity: &str, date: NaiveDate, article: &ParsedArticle) -> Vec<ChatMessage> {
    vec![
        ChatMessage::user(format!(
            "Summarize the article posted on {} below, highlight things related to company {}",
            date.format("%Y-%m-%d"),
            entity
        )),
        ChatMessage::user(article.text.as_str()),
    ]
}

fn encoding() -> Option<&'static CoreBPE> {
    static ENCODING: OnceLock<Option<CoreBPE>> = OnceLock::new();
    ENCODING
        .get_or_init(|| match tiktoken_rs::r50k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                warn!("Tokenizer unavailable, token counts disabled: {}", e);
                None
            }
        })
        .as_ref()
}

/// GPT-2 token count over all summaries. Diagnostic only.
pub fn token_count(summaries: &[String]) -> Option<usize> {
    let bpe = encoding()?;
    Some(
        summaries
            .iter()
            .map(|summary| bpe.encode_with_special_tokens(summary).len())
            .sum(),
    )
}
