use serde::Serialize;

use crate::errors::AssistantError;
use crate::faq::FaqSource;
use crate::index::{IndexCreation, IndexRecord};
use crate::service::{AssistantService, ServiceState};
use crate::transformers::http_handler::merge_input_output;
use crate::transformers::types::Inputs;
use crate::types::FaqEntry;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub index_created: bool,
    pub ingested: usize,
    pub skipped: usize,
}

impl AssistantService {
    /// Ensures the index exists and (re)ingests the FAQ source.
    ///
    /// Records are upserted on the FAQ id, so running this against an index
    /// that already holds the entries refreshes them instead of duplicating
    /// them. Any failure leaves the service `Failed` and is returned.
    pub async fn initialize(&self, source: &FaqSource) -> Result<IngestReport, AssistantError> {
        self.transition(ServiceState::Initializing)?;
        match self.ingest(source).await {
            Ok(report) => {
                self.transition(ServiceState::Ready)?;
                log::info!(
                    "assistant ready: index `{}` created={}, ingested={}, skipped={}",
                    self.index_spec.name,
                    report.index_created,
                    report.ingested,
                    report.skipped
                );
                Ok(report)
            }
            Err(e) => {
                log::error!("assistant initialization failed: {}", e);
                self.transition(ServiceState::Failed)?;
                Err(e)
            }
        }
    }

    async fn ingest(&self, source: &FaqSource) -> Result<IngestReport, AssistantError> {
        let batch_size = self.config.embedding_batch_size;
        if batch_size == 0 {
            return Err(AssistantError::InvalidConfig(
                "embedding batch size must be greater than 0".to_string(),
            ));
        }
        let creation = self.index.ensure_index(&self.index_spec).await?;
        match creation {
            IndexCreation::Created => log::info!(
                "created vector index `{}` (dim={}, metric={})",
                self.index_spec.name,
                self.index_spec.dimension,
                self.index_spec.metric
            ),
            IndexCreation::AlreadyExists => log::info!(
                "vector index `{}` already exists, skipping creation",
                self.index_spec.name
            ),
        }

        let load = source.load()?;
        let mut ingested = 0;
        for batch in load.entries.chunks(batch_size) {
            let records = self.embed_entries(batch).await?;
            ingested += self.index.upsert(records).await?;
        }

        Ok(IngestReport {
            index_created: creation == IndexCreation::Created,
            ingested,
            skipped: load.skipped,
        })
    }

    async fn embed_entries(&self, entries: &[FaqEntry]) -> Result<Vec<IndexRecord>, AssistantError> {
        let inputs: Vec<Inputs> = entries
            .iter()
            .map(|e| Inputs::new(e.id.clone(), e.question.clone()))
            .collect();
        let embeddings = self.embed(&inputs).await?;
        let paired = merge_input_output(inputs, embeddings)?;

        entries
            .iter()
            .zip(paired)
            .map(|(entry, pair)| {
                Ok(IndexRecord {
                    id: pair.primary_key,
                    content: entry.question.clone(),
                    metadata: serde_json::to_value(entry.metadata())?,
                    embedding: pair.embeddings,
                })
            })
            .collect()
    }
}
