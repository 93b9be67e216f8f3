//! Loading FAQ entries from the tabular source.
//!
//! The source is a CSV file with an `id,question,answer` header. Columns are
//! matched by header name, fields are trimmed, and quoted fields may contain
//! commas and newlines.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::errors::AssistantError;
use crate::types::FaqEntry;

const REQUIRED_COLUMNS: [&str; 3] = ["id", "question", "answer"];

#[derive(Clone, Debug)]
pub enum FaqSource {
    Path(PathBuf),
    Inline(String),
}

impl FaqSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        FaqSource::Path(path.as_ref().to_path_buf())
    }

    pub fn load(&self) -> Result<FaqLoad, AssistantError> {
        match self {
            FaqSource::Path(path) => {
                let file = File::open(path).map_err(|e| {
                    AssistantError::FaqSource(format!("failed to open {}: {}", path.display(), e))
                })?;
                load_faq_entries(file)
            }
            FaqSource::Inline(text) => load_faq_entries(text.as_bytes()),
        }
    }
}

#[derive(Debug, Default)]
pub struct FaqLoad {
    pub entries: Vec<FaqEntry>,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct FaqRow {
    id: Option<String>,
    question: Option<String>,
    answer: Option<String>,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

pub fn load_faq_entries<R: Read>(reader: R) -> Result<FaqLoad, AssistantError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            return Err(AssistantError::FaqSource(format!(
                "missing `{col}` column in header"
            )));
        }
    }

    let mut load = FaqLoad::default();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (row_num, result) in rdr.deserialize::<FaqRow>().enumerate() {
        // header is line 1
        let line = row_num + 2;
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("skipping unreadable faq row {}: {}", line, e);
                load.skipped += 1;
                continue;
            }
        };
        let (question, answer) = match (non_empty(row.question), non_empty(row.answer)) {
            (Some(q), Some(a)) => (q, a),
            _ => {
                log::warn!("skipping faq row {}: missing question or answer", line);
                load.skipped += 1;
                continue;
            }
        };
        let id = non_empty(row.id).unwrap_or_else(|| format!("faq-{line}"));
        let entry = FaqEntry::new(id.clone(), question, answer);
        match positions.get(&id) {
            Some(&pos) => {
                log::warn!("duplicate faq id `{}` at row {}, keeping the later row", id, line);
                load.entries[pos] = entry;
            }
            None => {
                positions.insert(id, load.entries.len());
                load.entries.push(entry);
            }
        }
    }
    Ok(load)
}
