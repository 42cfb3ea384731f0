//! Subject fact database.
//!
//! A small JSON-backed store of structured facts about known subjects
//! (books, products). Lookup is a normalized containment match: the
//! question text is lowercased and stripped of whitespace, then scanned
//! for each subject's name and aliases.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ChatError, Result};

// =============================================================================
// SubjectInfo
// =============================================================================

/// Structured facts for one subject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub awards: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Alternative names the subject may be referred to by.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl SubjectInfo {
    /// Serialize the facts (without aliases) as a JSON object for prompting.
    pub fn to_prompt_json(&self) -> serde_json::Value {
        let mut trimmed = self.clone();
        trimmed.aliases = Vec::new();
        serde_json::to_value(trimmed).unwrap_or(serde_json::Value::Null)
    }
}

// =============================================================================
// SubjectDb
// =============================================================================

/// In-memory subject database keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct SubjectDb {
    subjects: BTreeMap<String, SubjectInfo>,
}

impl SubjectDb {
    /// Load subjects from a JSON file mapping names to fact objects.
    ///
    /// A missing file yields an empty database with a warning rather
    /// than an error, so the pipeline can still serve other routes.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Subject database not found, starting empty");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(revu_core::RevuError::from)?;
        let subjects: BTreeMap<String, SubjectInfo> = serde_json::from_str(&raw)
            .map_err(|e| ChatError::Subjects(format!("failed to parse {}: {}", path.display(), e)))?;
        Ok(Self { subjects })
    }

    /// Build a database from an existing map. Used for seeding and tests.
    pub fn from_map(subjects: BTreeMap<String, SubjectInfo>) -> Self {
        Self { subjects }
    }

    /// Insert or replace a subject.
    pub fn insert(&mut self, name: impl Into<String>, info: SubjectInfo) {
        self.subjects.insert(name.into(), info);
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Find the subject a question refers to.
    ///
    /// Checks each subject's canonical name before its aliases, using
    /// normalized containment. When nothing matches and exactly one
    /// subject exists, that subject is returned as the default.
    pub fn find(&self, question: &str) -> Option<(&str, &SubjectInfo)> {
        let needle = normalize(question);
        if !needle.is_empty() {
            for (name, info) in &self.subjects {
                if needle.contains(&normalize(name)) {
                    return Some((name.as_str(), info));
                }
                for alias in &info.aliases {
                    let alias = normalize(alias);
                    if !alias.is_empty() && needle.contains(&alias) {
                        return Some((name.as_str(), info));
                    }
                }
            }
        }
        if self.subjects.len() == 1 {
            return self.subjects.iter().next().map(|(n, i)| (n.as_str(), i));
        }
        None
    }
}

/// Lowercase and strip all whitespace so that spacing and casing
/// differences do not defeat containment matching.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
