use anyhow::Error as AnyhowError;
use sqlx::error::Error as DbError;
use thiserror::Error;

use crate::service::ServiceState;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("assistant is not ready (state: {0})")]
    NotReady(ServiceState),
    #[error("invalid lifecycle transition from {0} to {1}")]
    InvalidTransition(ServiceState, ServiceState),
    #[error("vector index error: {0}")]
    Index(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("faq source error: {0}")]
    FaqSource(String),
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Serde error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("template error: {0}")]
    Template(#[from] handlebars::RenderError),
    #[error("An internal error occurred: {0}")]
    InternalError(#[from] AnyhowError),
}

impl From<DbError> for AssistantError {
    fn from(err: DbError) -> Self {
        AssistantError::DatabaseError(DatabaseError::Db(err))
    }
}

impl From<csv::Error> for AssistantError {
    fn from(err: csv::Error) -> Self {
        AssistantError::FaqSource(err.to_string())
    }
}
