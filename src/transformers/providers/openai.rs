use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use super::{EmbeddingProvider, GenericEmbeddingRequest, GenericEmbeddingResponse};
use crate::errors::AssistantError;
use crate::transformers::http_handler::handle_response;
use crate::transformers::providers;
use crate::transformers::types::Inputs;
use async_trait::async_trait;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const MAX_TOKEN_LEN: usize = 8192;
// max number of inputs accepted by a single embeddings call
pub const MAX_BATCH_INPUTS: usize = 2048;

pub struct OpenAIProvider {
    pub url: String,
    pub api_key: String,
    timeout: Duration,
    client: Client,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenAIEmbeddingBody {
    pub model: String,
    pub input: Vec<String>,
}

impl From<GenericEmbeddingRequest> for OpenAIEmbeddingBody {
    fn from(request: GenericEmbeddingRequest) -> Self {
        OpenAIEmbeddingBody {
            model: request.model,
            input: request.input,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenAIEmbeddingResponse {
    pub model: String,
    pub data: Vec<EmbeddingObject>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct EmbeddingObject {
    pub index: usize,
    pub embedding: Vec<f64>,
}

impl OpenAIEmbeddingResponse {
    // the api does not promise data is ordered, index does
    pub fn into_embeddings(mut self) -> Vec<Vec<f64>> {
        self.data.sort_by_key(|d| d.index);
        self.data.into_iter().map(|d| d.embedding).collect()
    }
}

impl OpenAIProvider {
    pub fn new(
        url: Option<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let final_url = match url {
            Some(url) => url,
            None => OPENAI_BASE_URL.to_string(),
        };
        let final_api_key = match api_key {
            Some(api_key) => api_key,
            None => env::var("OPENAI_API_KEY")
                .map_err(|_| AssistantError::Embedding("OPENAI_API_KEY not set".to_string()))?,
        };
        Ok(OpenAIProvider {
            url: final_url.trim_end_matches('/').to_string(),
            api_key: final_api_key,
            timeout,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn generate_embedding<'a>(
        &self,
        request: &'a GenericEmbeddingRequest,
    ) -> Result<GenericEmbeddingResponse, AssistantError> {
        let num_inputs = request.input.len();
        let todo_requests: Vec<OpenAIEmbeddingBody> =
            providers::split_vector(request.input.clone(), MAX_BATCH_INPUTS)
                .into_iter()
                .map(|chunk| OpenAIEmbeddingBody {
                    input: chunk,
                    model: request.model.clone(),
                })
                .collect();

        let mut all_embeddings: Vec<Vec<f64>> = Vec::with_capacity(num_inputs);

        for request_payload in todo_requests.iter() {
            let embeddings_url = format!("{}/embeddings", self.url);
            let response = self
                .client
                .post(&embeddings_url)
                .timeout(self.timeout)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(request_payload)
                .send()
                .await?;

            let embeddings =
                handle_response::<OpenAIEmbeddingResponse>(response, "embeddings").await?;
            all_embeddings.extend(embeddings.into_embeddings());
        }
        Ok(GenericEmbeddingResponse {
            embeddings: all_embeddings,
        })
    }

    async fn model_dim(&self, model_name: &str) -> Result<u32, AssistantError> {
        Ok(openai_embedding_dim(model_name) as u32)
    }
}

pub fn openai_embedding_dim(model_name: &str) -> i32 {
    match model_name {
        "text-embedding-3-large" => 3072,
        "text-embedding-3-small" => 1536,
        "text-embedding-ada-002" => 1536,
        _ => 1536,
    }
}

// OpenAI embedding model has a limit of 8192 tokens per input
// there can be a number of ways condense the inputs
pub fn trim_inputs(inputs: &[Inputs]) -> Vec<String> {
    inputs
        .iter()
        .map(|input| {
            if input.token_estimate as usize > MAX_TOKEN_LEN {
                // not example taking tokens, but naive way to trim input
                let tokens: Vec<&str> = input.inputs.split_whitespace().collect();
                tokens
                    .into_iter()
                    .take(MAX_TOKEN_LEN)
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                input.inputs.clone()
            }
        })
        .collect()
}
