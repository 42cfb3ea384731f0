use thiserror::Error;

/// Top-level error type for the Revu system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for RevuError`
/// so that the `?` operator works seamlessly across crate boundaries.
///
/// Only `Config` failures are allowed to abort startup; every per-turn
/// failure must degrade gracefully and leave the conversation usable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RevuError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for RevuError {
    fn from(err: toml::de::Error) -> Self {
        RevuError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for RevuError {
    fn from(err: toml::ser::Error) -> Self {
        RevuError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RevuError {
    fn from(err: serde_json::Error) -> Self {
        RevuError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Revu operations.
pub type Result<T> = std::result::Result<T, RevuError>;
