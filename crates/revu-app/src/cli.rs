//! CLI argument definitions for the Revu application.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Revu — a review-grounded conversational assistant.
#[derive(Parser, Debug)]
#[command(name = "revu", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Path to the review corpus (JSON Lines).
    #[arg(long = "corpus")]
    pub corpus: Option<PathBuf>,

    /// Path to the subjects JSON file.
    #[arg(long = "subjects")]
    pub subjects: Option<PathBuf>,

    /// Directory for the persisted dense index.
    #[arg(long = "index-dir")]
    pub index_dir: Option<PathBuf>,

    /// Skip the dense retriever and use the lexical index only.
    #[arg(long = "lexical-only")]
    pub lexical_only: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > REVU_CONFIG env var > platform default
    /// (~/.revu/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("REVU_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the corpus path.
    ///
    /// Priority: --corpus flag > REVU_CORPUS env var > config file value.
    pub fn resolve_corpus_path(&self, config_path: &str) -> PathBuf {
        if let Some(ref p) = self.corpus {
            return p.clone();
        }
        if let Ok(p) = std::env::var("REVU_CORPUS") {
            return PathBuf::from(p);
        }
        PathBuf::from(config_path)
    }

    /// Resolve the subjects file path.
    ///
    /// Priority: --subjects flag > config file value.
    pub fn resolve_subjects_path(&self, config_path: &str) -> PathBuf {
        self.subjects
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_path))
    }

    /// Resolve the dense index directory.
    ///
    /// Priority: --index-dir flag > config file value.
    pub fn resolve_index_dir(&self, config_dir: &str) -> PathBuf {
        self.index_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(config_dir))
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".revu").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".revu").join("config.toml");
    }
    PathBuf::from("config.toml")
}

// =============================================================================
// Tests
// =============================================================================
