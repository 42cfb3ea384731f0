//! Conversation pipeline for Revu.
//!
//! Routes each user turn to one of three answer composers (general chat,
//! subject fact lookup, review-grounded synthesis), maintains bounded
//! per-session memory, and orchestrates router → composer execution with
//! graceful degradation on every external failure.

pub mod error;
pub mod graph;
pub mod memory;
pub mod nodes;
pub mod prompt;
pub mod router;
pub mod state;
pub mod subjects;

pub use error::ChatError;
pub use graph::GraphOrchestrator;
pub use memory::{ConversationMemory, MemoryEntry};
pub use nodes::{ChatComposer, Composer, RagReviewComposer, SubjectInfoComposer};
pub use router::IntentRouter;
pub use state::{ConversationState, NodeError, StateDelta};
pub use subjects::{SubjectDb, SubjectInfo};
