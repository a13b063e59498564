use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedArticle {
    pub url: String,
    pub title: String,
    pub text: String,
}

impl ParsedArticle {
    pub fn new(url: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
        }
    }

    /// Builds an article from a plain `url`/`title`/`text` mapping.
    /// Returns `None` when any of the three fields is absent.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            url: fields.get("url")?.clone(),
            title: fields.get("title")?.clone(),
            text: fields.get("text")?.clone(),
        })
    }
}

impl fmt::Display for ParsedArticle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "url:{},title={}", self.url, self.title)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// Reads a model answer. Only a bare label is accepted, in any letter case
    /// and with surrounding whitespace ignored; extra words or punctuation make
    /// the answer invalid.
    pub fn parse_response(response: &str) -> Option<Self> {
        let normalized = response.trim().to_lowercase();
        Self::ALL.into_iter().find(|label| label.as_str() == normalized)
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const SENTIMENT_ERROR: &str = "ERROR";

/// Outcome of a classification: a label, or the `ERROR` sentinel once every
/// attempt produced an invalid answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Sentiment {
    Label(SentimentLabel),
    Error,
}

impl Sentiment {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn action(&self) -> i8 {
        match self {
            Self::Label(SentimentLabel::Positive) => 1,
            Self::Label(SentimentLabel::Negative) => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => label.fmt(f),
            Self::Error => f.write_str(SENTIMENT_ERROR),
        }
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == SENTIMENT_ERROR {
            return Ok(Self::Error);
        }
        SentimentLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .map(Self::Label)
            .ok_or_else(|| format!("unknown sentiment: {s}"))
    }
}

impl From<Sentiment> for String {
    fn from(sentiment: Sentiment) -> Self {
        sentiment.to_string()
    }
}

impl TryFrom<String> for Sentiment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<SentimentLabel> for Sentiment {
    fn from(label: SentimentLabel) -> Self {
        Self::Label(label)
    }
}

/// Trading signal for one identifier. Serialized with the identifier under
/// `tokenPair`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(rename = "tokenPair")]
    pub identifier: String,
    pub action: i8,
    pub timestamp: f64,
}

impl Signal {
    pub fn from_sentiment(identifier: impl Into<String>, sentiment: Sentiment, timestamp: f64) -> Self {
        Self {
            identifier: identifier.into(),
            action: sentiment.action(),
            timestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}
