//! Error types for the conversation pipeline.

use thiserror::Error;

/// Errors raised while routing and composing turns.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChatError {
    /// Intent classification failed before a route could be chosen.
    #[error("routing error: {0}")]
    Routing(String),

    /// The subject database could not be loaded or parsed.
    #[error("subject database error: {0}")]
    Subjects(String),

    /// A core-level error surfaced through the pipeline.
    #[error(transparent)]
    Core(#[from] revu_core::RevuError),
}

pub type Result<T> = std::result::Result<T, ChatError>;

// ---------------------------------------------------------------------------
