//! Language-model completion service for Revu.
//!
//! Defines the provider-agnostic `CompletionService` contract, an HTTP
//! client for OpenAI-compatible chat endpoints, and deterministic mocks
//! for tests.

pub mod completion;
pub mod http;
pub mod mock;

pub use completion::{Completion, CompletionService};
pub use http::HttpCompletionClient;
pub use mock::{FailingCompletion, MockCompletion};
