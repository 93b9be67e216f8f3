use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use super::{EmbeddingProvider, GenericEmbeddingRequest, GenericEmbeddingResponse};
use crate::errors::AssistantError;
use crate::transformers::http_handler::handle_response;
use crate::transformers::providers::{openai, split_vector};
use async_trait::async_trait;

pub const VECTOR_SERVE_BASE_URL: &str = "http://localhost:3000/v1";

/// Self-hosted sentence-transformers server with an OpenAI-compatible schema.
pub struct VectorServeProvider {
    pub url: String,
    pub api_key: Option<String>,
    timeout: Duration,
    client: Client,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ModelInfo {
    model: String,
    embedding_dimension: u32,
    max_seq_len: u32,
}

impl VectorServeProvider {
    pub fn new(url: Option<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let final_url = match url {
            Some(url) => url,
            None => VECTOR_SERVE_BASE_URL.to_string(),
        };
        let final_api_key = match api_key {
            Some(api_key) => Some(api_key),
            // API key is optional for vector-serve
            None => env::var("EMBEDDING_SVC_API_KEY").ok(),
        };
        VectorServeProvider {
            url: final_url.trim_end_matches('/').to_string(),
            api_key: final_api_key,
            timeout,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for VectorServeProvider {
    async fn generate_embedding<'a>(
        &self,
        request: &'a GenericEmbeddingRequest,
    ) -> Result<GenericEmbeddingResponse, AssistantError> {
        let num_inputs = request.input.len();
        let mut all_embeddings: Vec<Vec<f64>> = Vec::with_capacity(num_inputs);

        for chunk in split_vector(request.input.clone(), openai::MAX_BATCH_INPUTS) {
            let payload = openai::OpenAIEmbeddingBody {
                input: chunk,
                model: request.model.clone(),
            };
            let embeddings_url = format!("{}/embeddings", self.url);
            let mut req = self
                .client
                .post(&embeddings_url)
                .timeout(self.timeout)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .json(&payload);
            if let Some(key) = &self.api_key {
                req = req.header("Authorization", format!("Bearer {}", key));
            }
            let response = req.send().await?;
            let embeddings =
                handle_response::<openai::OpenAIEmbeddingResponse>(response, "embeddings").await?;
            all_embeddings.extend(embeddings.into_embeddings());
        }
        Ok(GenericEmbeddingResponse {
            embeddings: all_embeddings,
        })
    }

    async fn model_dim(&self, model_name: &str) -> Result<u32, AssistantError> {
        let mut req = self
            .client
            .get(format!("{}/info", self.url))
            .query(&[("model_name", model_name)])
            .timeout(self.timeout)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }
        let response = req.send().await?;
        let model_info = handle_response::<ModelInfo>(response, "model_info").await?;
        Ok(model_info.embedding_dimension)
    }
}
