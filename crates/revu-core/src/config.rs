use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, RevuError};

/// Top-level configuration for the Revu application.
///
/// Loaded from `~/.revu/config.toml` by default. Each section corresponds
/// to one subsystem of the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevuConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub subjects: SubjectsConfig,
}

impl RevuConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RevuConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| RevuError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the persisted index and other state.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.revu/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Language-model completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds for network calls.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.upstage.ai".to_string(),
            model: "solar-1-mini-chat".to_string(),
            temperature: 0.2,
            api_key_env: "UPSTAGE_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Remote embedding service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the OpenAI-compatible embeddings endpoint.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Maximum texts per embeddings request.
    pub batch_size: usize,
    /// Request timeout in seconds for network calls.
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.upstage.ai".to_string(),
            model: "solar-embedding-1-large".to_string(),
            api_key_env: "UPSTAGE_API_KEY".to_string(),
            batch_size: 32,
            timeout_secs: 30,
        }
    }
}

/// Retrieval settings shared by the lexical and dense retrievers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of snippets to retrieve per question.
    pub k: usize,
    /// Vocabulary size cap for the TF-IDF vector space.
    pub max_features: usize,
    /// Maximum characters in the formatted context block.
    pub context_max_chars: usize,
    /// Directory for the persisted dense index.
    pub index_dir: String,
    /// Path to the review corpus (JSON Lines).
    pub corpus_path: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: 4,
            max_features: 5000,
            context_max_chars: 1400,
            index_dir: "~/.revu/data/index".to_string(),
            corpus_path: "reviews.jsonl".to_string(),
        }
    }
}

/// Bounded conversational memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum short-term entries retained.
    pub max_short_term: usize,
    /// Maximum long-term entries retained.
    pub max_long_term: usize,
    /// Long-term entries older than this many days are purged.
    pub decay_days: i64,
    /// Minimum importance for long-term admission.
    pub importance_threshold: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_short_term: 40,
            max_long_term: 100,
            decay_days: 30,
            importance_threshold: 0.7,
        }
    }
}

/// Subject knowledge base settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectsConfig {
    /// Path to the subjects JSON file.
    pub path: String,
}

impl Default for SubjectsConfig {
    fn default() -> Self {
        Self {
            path: "subjects.json".to_string(),
        }
    }
}
