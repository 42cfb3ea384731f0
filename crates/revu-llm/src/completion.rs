//! Completion service contract.
//!
//! Any provider that accepts a text prompt (optionally with a system
//! instruction) and returns a text completion can stand behind this trait.

use async_trait::async_trait;

use revu_core::error::Result;

/// Result of a language-model completion call.
///
/// A single explicit type with a guaranteed text field; callers never probe
/// for optional attributes on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Service producing text completions from prompts.
///
/// Calls block the turn until the provider responds or the bounded timeout
/// elapses; failures surface immediately to the caller's local handler,
/// never retried automatically.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Complete a prompt with the default system instruction.
    async fn complete(&self, prompt: &str) -> Result<Completion>;

    /// Complete a prompt under an explicit system instruction.
    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<Completion>;
}
