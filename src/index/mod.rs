//! Vector index boundary.
//!
//! The assistant only needs three operations from a nearest-neighbour store:
//! make sure the index exists, write records keyed by id, and fetch the
//! closest records to a query vector. Similarity scoring happens inside the
//! store; callers never re-rank.

pub mod memory;
pub mod pgvector;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::errors::AssistantError;
use crate::query::check_input;

pub use memory::InMemoryIndex;
pub use pgvector::PgVectorIndex;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SimilarityMetric {
    #[default]
    pgv_hnsw_cosine,
}

impl Display for SimilarityMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            SimilarityMetric::pgv_hnsw_cosine => write!(f, "pgv_hnsw_cosine"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pgv_hnsw_cosine" | "cosine" => Ok(SimilarityMetric::pgv_hnsw_cosine),
            _ => Err(format!("Invalid value: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: SimilarityMetric,
}

impl IndexSpec {
    pub fn new(name: &str, dimension: usize) -> Result<Self, AssistantError> {
        check_input(name)?;
        Ok(IndexSpec {
            name: name.to_string(),
            dimension,
            metric: SimilarityMetric::pgv_hnsw_cosine,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexCreation {
    Created,
    AlreadyExists,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexRecord {
    pub id: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub embedding: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatch {
    pub record_id: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub similarity_score: f64,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the index when it is missing; an existing index is left as is.
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexCreation, AssistantError>;

    /// Inserts or replaces records keyed on `IndexRecord::id`.
    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, AssistantError>;

    /// Returns up to `k` records ordered by descending similarity.
    async fn query_nearest(
        &self,
        embedding: &[f64],
        k: usize,
    ) -> Result<Vec<SimilarityMatch>, AssistantError>;
}

pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
