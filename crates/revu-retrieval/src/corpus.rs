//! Corpus documents and loading.
//!
//! The document store producing these pairs is a collaborator; the
//! retrievers only need an ordered collection of (text, metadata) pairs.
//! The JSON-lines loader here consumes that collaborator's export format:
//! one `{"text": ..., "source": ..., "date"?: ..., "rating"?: ...}` object
//! per line.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use revu_core::error::Result;

/// A single corpus document: snippet text plus its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub text: String,
    pub metadata: Value,
}

impl CorpusDocument {
    pub fn new(text: impl Into<String>, metadata: Value) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

#[derive(Deserialize)]
struct CorpusLine {
    text: String,
    source: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
}

/// Load corpus documents from a JSON-lines file.
///
/// Missing files yield an empty corpus, and malformed or empty-text lines
/// are skipped; an unreadable corpus must never prevent the pipeline from
/// starting.
pub fn load_jsonl(path: &Path) -> Result<Vec<CorpusDocument>> {
    if !path.exists() {
        warn!(path = %path.display(), "Corpus file not found; starting with an empty corpus");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)?;
    let mut docs = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<CorpusLine>(line) {
            Ok(parsed) if !parsed.text.trim().is_empty() => {
                let mut metadata = serde_json::json!({
                    "source": parsed.source,
                    "row_index": line_no,
                });
                if let Some(date) = parsed.date {
                    metadata["date"] = Value::String(date);
                }
                if let Some(rating) = parsed.rating {
                    metadata["rating"] = serde_json::json!(rating);
                }
                docs.push(CorpusDocument::new(parsed.text, metadata));
            }
            Ok(_) => debug!(line = line_no, "Skipping corpus line with empty text"),
            Err(e) => debug!(line = line_no, error = %e, "Skipping malformed corpus line"),
        }
    }

    debug!(count = docs.len(), path = %path.display(), "Corpus loaded");
    Ok(docs)
}
