use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tiktoken_rs::{cl100k_base, CoreBPE};

lazy_static! {
    // the embedding models served here all share the cl100k vocabulary
    static ref BPE: Option<CoreBPE> = cl100k_base().ok();
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Inputs {
    pub record_id: String,   // the value to join the record
    pub inputs: String,      // text sent to the embedding model
    pub token_estimate: i32, // estimated token count
}

impl Inputs {
    pub fn new(record_id: impl Into<String>, text: impl Into<String>) -> Self {
        let inputs = text.into();
        Inputs {
            record_id: record_id.into(),
            token_estimate: estimate_tokens(&inputs),
            inputs,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PairedEmbeddings {
    pub primary_key: String,
    pub embeddings: Vec<f64>,
}

pub fn estimate_tokens(text: &str) -> i32 {
    match BPE.as_ref() {
        Some(bpe) => bpe.encode_ordinary(text).len() as i32,
        None => text.split_whitespace().count() as i32,
    }
}
