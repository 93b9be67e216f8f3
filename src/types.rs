use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Token inside a stored answer that marks it as an order-status lookup.
pub const ORDER_STATUS_MARKER: &str = "[ORDER_STATUS]";

lazy_static! {
    static ref USER_ID_RE: Regex = Regex::new(r"^[0-9a-fA-F]{24}$").expect("invalid user id regex");
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Model {
    pub source: ModelSource,
    pub name: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid model source")]
    InvalidSource,
    #[error("Invalid model format: {0}")]
    InvalidFormat(String),
}

impl Model {
    pub fn new(input: &str) -> Result<Self, ModelError> {
        let mut parts: Vec<&str> = input.split('/').collect();
        let missing_source = parts.len() != 2;
        if missing_source && parts[0] == "text-embedding-ada-002" {
            // for backwards compatibility, prepend "openai" to text-embedding-ada-2
            parts.insert(0, "openai");
        } else if missing_source {
            return Err(ModelError::InvalidFormat(input.to_string()));
        }

        let source = parts[0]
            .parse::<ModelSource>()
            .map_err(|_| ModelError::InvalidSource)?;

        Ok(Self {
            source,
            name: parts[1].to_string(),
        })
    }

    // the name sent to the embedding api
    pub fn api_name(&self) -> String {
        self.name.clone()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.name)
    }
}

// model sources are places that serve models
// each source can have its own API schema
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum ModelSource {
    OpenAI,
    SentenceTransformers,
}

impl FromStr for ModelSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ModelSource::OpenAI),
            "sentence-transformers" => Ok(ModelSource::SentenceTransformers),
            _ => Err(format!("Invalid value: {}", s)),
        }
    }
}

impl Display for ModelSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            ModelSource::OpenAI => write!(f, "openai"),
            ModelSource::SentenceTransformers => write!(f, "sentence-transformers"),
        }
    }
}

/// How a stored answer is delivered to the caller.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    #[default]
    PlainAnswer,
    OrderStatusTemplate,
}

impl AnswerKind {
    pub fn classify(answer: &str) -> Self {
        if answer.contains(ORDER_STATUS_MARKER) {
            AnswerKind::OrderStatusTemplate
        } else {
            AnswerKind::PlainAnswer
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaqEntry {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub kind: AnswerKind,
}

impl FaqEntry {
    pub fn new(id: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let answer = answer.into();
        FaqEntry {
            id: id.into(),
            question: question.into(),
            kind: AnswerKind::classify(&answer),
            answer,
        }
    }

    pub fn metadata(&self) -> FaqMetadata {
        FaqMetadata {
            id: self.id.clone(),
            answer: self.answer.clone(),
            kind: Some(self.kind),
        }
    }
}

/// Metadata attached to every record in the vector index.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FaqMetadata {
    pub id: String,
    pub answer: String,
    // absent on records written before the kind was stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnswerKind>,
}

impl FaqMetadata {
    pub fn kind(&self) -> AnswerKind {
        self.kind
            .unwrap_or_else(|| AnswerKind::classify(&self.answer))
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Cancelled,
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "shipped" => Ok(OrderStatus::Shipped),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid value: {}", s)),
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Shipped => write!(f, "Shipped"),
            OrderStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct OrderSummary {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

/// A caller identity in the shape the order store keys on: 24 hex characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if USER_ID_RE.is_match(raw) {
            Some(UserId(raw.to_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod model_tests {
    use super::*;

    #[test]
    fn test_valid_model_openai() {
        let model = Model::new("openai/model-name").unwrap();
        assert_eq!(model.source, ModelSource::OpenAI);
        assert_eq!(model.name, "model-name");
    }

    #[test]
    fn test_valid_model_sentencetransformers() {
        let model = Model::new("sentence-transformers/model-name").unwrap();
        assert_eq!(model.source, ModelSource::SentenceTransformers);
        assert_eq!(model.name, "model-name");
    }

    #[test]
    fn test_invalid_model_source() {
        assert_eq!(
            Model::new("invalidsource/model-name").unwrap_err(),
            ModelError::InvalidSource
        );
    }

    #[test]
    fn test_invalid_format_extra_slash() {
        assert!(Model::new("openai/model/name").is_err());
    }

    #[test]
    fn test_backwards_compatibility() {
        let model = Model::new("text-embedding-ada-002").unwrap();
        assert_eq!(model.source, ModelSource::OpenAI);
        assert_eq!(model.to_string(), "openai/text-embedding-ada-002");
    }
}
