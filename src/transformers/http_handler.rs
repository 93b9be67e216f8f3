use crate::errors::AssistantError;
use crate::transformers::types::{Inputs, PairedEmbeddings};

pub async fn handle_response<T: for<'de> serde::Deserialize<'de>>(
    resp: reqwest::Response,
    method: &'static str,
) -> Result<T, AssistantError> {
    if !resp.status().is_success() {
        let errmsg = format!(
            "Failed to call method '{}', received response with status code:{} and body: {}",
            method,
            resp.status(),
            resp.text().await?
        );
        log::warn!("bookstore-assistant: error handling response: {}", errmsg);
        return Err(AssistantError::Embedding(errmsg));
    }
    let value = resp.json::<T>().await?;
    Ok(value)
}

// merges the vec of inputs with the embedding responses
pub fn merge_input_output(
    inputs: Vec<Inputs>,
    values: Vec<Vec<f64>>,
) -> Result<Vec<PairedEmbeddings>, AssistantError> {
    if inputs.len() != values.len() {
        return Err(AssistantError::Embedding(format!(
            "expected {} embeddings, received {}",
            inputs.len(),
            values.len()
        )));
    }
    Ok(inputs
        .into_iter()
        .zip(values)
        .map(|(input, value)| PairedEmbeddings {
            primary_key: input.record_id,
            embeddings: value,
        })
        .collect())
}
