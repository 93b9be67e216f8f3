use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use super::{
    cosine_similarity, IndexCreation, IndexRecord, IndexSpec, SimilarityMatch, VectorIndex,
};
use crate::errors::AssistantError;

/// Brute-force cosine index held in process memory.
///
/// Used for local development without a database and in tests. Scores are
/// exact, so an identical query vector always ranks its record first.
#[derive(Default)]
pub struct InMemoryIndex {
    spec: RwLock<Option<IndexSpec>>,
    records: RwLock<HashMap<String, IndexRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> Result<usize, AssistantError> {
        let spec = self
            .spec
            .read()
            .map_err(|_| AssistantError::Index("index lock poisoned".to_string()))?;
        spec.as_ref()
            .map(|s| s.dimension)
            .ok_or_else(|| AssistantError::Index("index has not been created".to_string()))
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexCreation, AssistantError> {
        let mut current = self
            .spec
            .write()
            .map_err(|_| AssistantError::Index("index lock poisoned".to_string()))?;
        match current.as_ref() {
            Some(existing) if existing.dimension != spec.dimension => {
                Err(AssistantError::DimensionMismatch {
                    expected: spec.dimension,
                    actual: existing.dimension,
                })
            }
            Some(_) => Ok(IndexCreation::AlreadyExists),
            None => {
                *current = Some(spec.clone());
                Ok(IndexCreation::Created)
            }
        }
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, AssistantError> {
        let dim = self.dimension()?;
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != dim) {
            return Err(AssistantError::DimensionMismatch {
                expected: dim,
                actual: bad.embedding.len(),
            });
        }
        let mut stored = self
            .records
            .write()
            .map_err(|_| AssistantError::Index("index lock poisoned".to_string()))?;
        let count = records.len();
        for record in records {
            stored.insert(record.id.clone(), record);
        }
        Ok(count)
    }

    async fn query_nearest(
        &self,
        embedding: &[f64],
        k: usize,
    ) -> Result<Vec<SimilarityMatch>, AssistantError> {
        let dim = self.dimension()?;
        if embedding.len() != dim {
            return Err(AssistantError::DimensionMismatch {
                expected: dim,
                actual: embedding.len(),
            });
        }
        let stored = self
            .records
            .read()
            .map_err(|_| AssistantError::Index("index lock poisoned".to_string()))?;
        let mut matches: Vec<SimilarityMatch> = stored
            .values()
            .map(|r| SimilarityMatch {
                record_id: r.id.clone(),
                content: r.content.clone(),
                metadata: r.metadata.clone(),
                similarity_score: cosine_similarity(embedding, &r.embedding),
            })
            .collect();
        matches.sort_by(|a, b| {
            b.similarity_score
                .partial_cmp(&a.similarity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        matches.truncate(k);
        Ok(matches)
    }
}
