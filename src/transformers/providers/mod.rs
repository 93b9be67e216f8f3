pub mod openai;
pub mod vector_serve;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::Inputs;
use crate::errors::AssistantError;
use crate::transformers::providers;
use crate::types::{Model, ModelSource};

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn generate_embedding<'a>(
        &self,
        request: &'a GenericEmbeddingRequest,
    ) -> Result<GenericEmbeddingResponse, AssistantError>;
    async fn model_dim(&self, model_name: &str) -> Result<u32, AssistantError>;
}

#[derive(Clone, Deserialize, Debug, Serialize)]
pub struct GenericEmbeddingRequest {
    pub input: Vec<String>,
    pub model: String,
}

#[derive(Deserialize, Debug)]
pub struct GenericEmbeddingResponse {
    pub embeddings: Vec<Vec<f64>>,
}

pub fn prepare_generic_embedding_request(
    model: &Model,
    inputs: &[Inputs],
) -> GenericEmbeddingRequest {
    let text_inputs = providers::openai::trim_inputs(inputs);

    GenericEmbeddingRequest {
        input: text_inputs,
        model: model.api_name(),
    }
}

pub fn get_provider(
    model_source: &ModelSource,
    api_key: Option<String>,
    url: Option<String>,
    timeout: Duration,
) -> Result<Box<dyn EmbeddingProvider>, AssistantError> {
    match model_source {
        ModelSource::OpenAI => Ok(Box::new(providers::openai::OpenAIProvider::new(
            url, api_key, timeout,
        )?)),
        ModelSource::SentenceTransformers => Ok(Box::new(
            providers::vector_serve::VectorServeProvider::new(url, api_key, timeout),
        )),
    }
}

fn split_vector(vec: Vec<String>, chunk_size: usize) -> Vec<Vec<String>> {
    vec.chunks(chunk_size).map(|chunk| chunk.to_vec()).collect()
}
