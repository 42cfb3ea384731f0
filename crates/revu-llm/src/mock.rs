//! Deterministic completion mocks for tests.
//!
//! `MockCompletion` replays a fixed script of responses (cycling on the last
//! one), counting calls so tests can assert cost-avoidance short circuits.
//! `FailingCompletion` errors on every call to exercise failure paths.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use revu_core::error::{Result, RevuError};

use crate::completion::{Completion, CompletionService};

/// Mock completion service replaying a scripted sequence of responses.
#[derive(Debug, Default)]
pub struct MockCompletion {
    script: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockCompletion {
    /// A mock that answers every prompt with the same text.
    pub fn always(text: impl Into<String>) -> Self {
        Self::scripted(vec![text.into()])
    }

    /// A mock that replays the given responses in order, repeating the
    /// final entry once the script is exhausted.
    pub fn scripted(responses: Vec<String>) -> Self {
        Self {
            script: Mutex::new(responses),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of completion calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, _prompt: &str) -> Result<Completion> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .script
            .lock()
            .map_err(|e| RevuError::Llm(format!("mock script lock poisoned: {}", e)))?;
        let text = script
            .get(n)
            .or_else(|| script.last())
            .cloned()
            .unwrap_or_default();
        Ok(Completion::new(text))
    }

    async fn complete_with_system(&self, _system: &str, prompt: &str) -> Result<Completion> {
        self.complete(prompt).await
    }
}

/// Completion service that fails every call.
#[derive(Debug, Default)]
pub struct FailingCompletion {
    calls: AtomicUsize,
}

impl FailingCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completion calls attempted so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionService for FailingCompletion {
    async fn complete(&self, _prompt: &str) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RevuError::Llm("completion service unreachable".to_string()))
    }

    async fn complete_with_system(&self, _system: &str, prompt: &str) -> Result<Completion> {
        self.complete(prompt).await
    }
}
