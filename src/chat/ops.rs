use crate::errors::AssistantError;
use crate::service::{with_timeout, AssistantService};
use crate::transformers::types::Inputs;
use crate::types::{AnswerKind, FaqMetadata};

pub const FALLBACK_MESSAGE: &str = "Sorry, I couldn't find an answer to that question.";

// nearest neighbour only; the best match decides the answer
const TOP_K: usize = 1;

impl AssistantService {
    /// Answers a chat message from the FAQ index.
    ///
    /// `history` is accepted but does not influence retrieval.
    pub async fn process_message(
        &self,
        message: &str,
        user_id: Option<&str>,
        history: &[String],
    ) -> Result<String, AssistantError> {
        self.ensure_ready()?;
        if !history.is_empty() {
            log::debug!("ignoring {} history messages", history.len());
        }

        let message = message.trim();
        if message.is_empty() {
            return Ok(FALLBACK_MESSAGE.to_string());
        }

        let mut embeddings = self.embed(&[Inputs::new("query", message)]).await?;
        let query_vector = embeddings.pop().ok_or_else(|| {
            AssistantError::Embedding("no embedding returned for message".to_string())
        })?;

        let matches = with_timeout(
            "vector query",
            self.config.vector_query_timeout,
            self.index.query_nearest(&query_vector, TOP_K),
        )
        .await?;
        let best = match matches.into_iter().next() {
            Some(m) => m,
            None => {
                log::debug!("no faq match for message");
                return Ok(FALLBACK_MESSAGE.to_string());
            }
        };

        if let Some(min) = self.config.min_similarity {
            if best.similarity_score < min {
                log::debug!(
                    "best match {} scored {:.4}, below threshold {}",
                    best.record_id,
                    best.similarity_score,
                    min
                );
                return Ok(FALLBACK_MESSAGE.to_string());
            }
        }

        let metadata: FaqMetadata = serde_json::from_value(best.metadata).map_err(|e| {
            AssistantError::Index(format!(
                "record {} has malformed metadata: {}",
                best.record_id, e
            ))
        })?;
        log::debug!(
            "matched faq {} (score {:.4}) as {:?}",
            metadata.id,
            best.similarity_score,
            metadata.kind()
        );

        match metadata.kind() {
            AnswerKind::PlainAnswer => Ok(metadata.answer),
            AnswerKind::OrderStatusTemplate => self.order_status.respond(user_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::order_status::{LOGIN_PROMPT, NO_ORDERS};
    use crate::errors::AssistantError;
    use crate::index::{InMemoryIndex, IndexRecord, IndexSpec, VectorIndex};
    use crate::orders::InMemoryOrderStore;
    use crate::service::ServiceState;
    use crate::transformers::providers::{
        EmbeddingProvider, GenericEmbeddingRequest, GenericEmbeddingResponse,
    };
    use crate::types::FaqEntry;
    use crate::util::ServiceConfig;
    use async_trait::async_trait;
    use std::sync::Arc;

    const DIM: usize = 4;

    // maps a few keywords onto fixed axes
    struct KeywordEmbedder;

    fn keyword_vector(text: &str) -> Vec<f64> {
        let text = text.to_lowercase();
        let mut v = vec![0.0; DIM];
        for (axis, word) in ["shipping", "order", "return", "hours"].iter().enumerate() {
            if text.contains(word) {
                v[axis] = 1.0;
            }
        }
        v
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn generate_embedding<'a>(
            &self,
            request: &'a GenericEmbeddingRequest,
        ) -> Result<GenericEmbeddingResponse, AssistantError> {
            Ok(GenericEmbeddingResponse {
                embeddings: request.input.iter().map(|t| keyword_vector(t)).collect(),
            })
        }

        async fn model_dim(&self, _model_name: &str) -> Result<u32, AssistantError> {
            Ok(DIM as u32)
        }
    }

    async fn ready_service(config: ServiceConfig) -> AssistantService {
        let index = Arc::new(InMemoryIndex::new());
        let spec = IndexSpec::new("faq", DIM).unwrap();
        index.ensure_index(&spec).await.unwrap();
        let entries = [
            FaqEntry::new("1", "How long does shipping take?", "3-5 business days."),
            FaqEntry::new("2", "Where is my order?", "[ORDER_STATUS]"),
        ];
        let records = entries
            .iter()
            .map(|e| IndexRecord {
                id: e.id.clone(),
                content: e.question.clone(),
                metadata: serde_json::to_value(e.metadata()).unwrap(),
                embedding: keyword_vector(&e.question),
            })
            .collect();
        index.upsert(records).await.unwrap();

        let service = AssistantService::new(
            Arc::new(KeywordEmbedder),
            index,
            Arc::new(InMemoryOrderStore::default()),
            spec,
            config,
        );
        service.transition(ServiceState::Initializing).unwrap();
        service.transition(ServiceState::Ready).unwrap();
        service
    }

    #[tokio::test]
    async fn test_not_ready_rejects_queries() {
        let service = AssistantService::new(
            Arc::new(KeywordEmbedder),
            Arc::new(InMemoryIndex::new()),
            Arc::new(InMemoryOrderStore::default()),
            IndexSpec::new("faq", DIM).unwrap(),
            ServiceConfig::default(),
        );
        let err = service.process_message("hi", None, &[]).await.unwrap_err();
        assert!(matches!(
            err,
            AssistantError::NotReady(ServiceState::Uninitialized)
        ));
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let service = ready_service(ServiceConfig::default()).await;
        let reply = service
            .process_message("how long is shipping?", None, &[])
            .await
            .unwrap();
        assert_eq!(reply, "3-5 business days.");
    }

    #[tokio::test]
    async fn test_blank_message_falls_back() {
        let service = ready_service(ServiceConfig::default()).await;
        for msg in ["", "   ", "\n\t"] {
            assert_eq!(
                service.process_message(msg, None, &[]).await.unwrap(),
                FALLBACK_MESSAGE
            );
        }
    }

    #[tokio::test]
    async fn test_order_status_branch() {
        let service = ready_service(ServiceConfig::default()).await;
        let reply = service
            .process_message("where is my order", None, &[])
            .await
            .unwrap();
        assert_eq!(reply, LOGIN_PROMPT);

        let reply = service
            .process_message("where is my order", Some("64b7f0c2a1e4d3b2c1a09f8e"), &[])
            .await
            .unwrap();
        assert_eq!(reply, NO_ORDERS);
    }

    #[tokio::test]
    async fn test_min_similarity_gate() {
        let config = ServiceConfig {
            min_similarity: Some(0.9),
            ..ServiceConfig::default()
        };
        let service = ready_service(config).await;
        // orthogonal to every stored question
        let reply = service
            .process_message("what are your hours?", None, &[])
            .await
            .unwrap();
        assert_eq!(reply, FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_history_is_ignored() {
        let service = ready_service(ServiceConfig::default()).await;
        let history = vec!["where is my order".to_string()];
        let reply = service
            .process_message("shipping time?", None, &history)
            .await
            .unwrap();
        assert_eq!(reply, "3-5 business days.");
    }
}
