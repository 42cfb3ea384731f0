//! Per-session conversation state and turn deltas.
//!
//! Composers never mutate state directly. Each turn produces a
//! [`StateDelta`] which the orchestrator applies: message lists append,
//! scalar fields overwrite, and the error slot is cleared whenever a turn
//! completes without reporting one.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use revu_core::config::MemoryConfig;
use revu_core::types::{Citation, Message, Role, TurnRequest, TurnResponse};

use crate::memory::ConversationMemory;

// =============================================================================
// NodeError
// =============================================================================

/// A failure recorded by a composer, kept on the state for inspection
/// rather than aborting the turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeError {
    /// Name of the node that failed.
    pub node: String,
    /// Human-readable failure detail.
    pub detail: String,
}

impl NodeError {
    pub fn new(node: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            detail: detail.into(),
        }
    }
}

// =============================================================================
// StateDelta
// =============================================================================

/// The outcome of one composer invocation.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    /// Assistant message produced this turn, if any.
    pub message: Option<Message>,
    /// Citations backing the message. Replaces the previous set.
    pub citations: Vec<Citation>,
    /// Route token for this turn (e.g. `"rag_review"` or `"chat:error"`).
    pub last_route: Option<String>,
    /// Failure recorded during composition, if any.
    pub error: Option<NodeError>,
}

// =============================================================================
// ConversationState
// =============================================================================

/// Accumulated state for one conversation session.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Stable identifier for the session.
    pub session_id: Uuid,
    /// Full message transcript, oldest first.
    pub messages: Vec<Message>,
    /// Number of documents to retrieve for grounded routes.
    pub k: usize,
    /// Route token chosen on the most recent turn.
    pub last_route: Option<String>,
    /// Citations backing the most recent grounded answer.
    pub citations: Vec<Citation>,
    /// Failure recorded on the most recent turn, if any.
    pub error: Option<NodeError>,
    /// Bounded conversation memory fed from the transcript.
    pub memory: ConversationMemory,
}

impl ConversationState {
    /// Create a fresh session with the given retrieval depth and memory bounds.
    pub fn new(k: usize, memory_config: MemoryConfig) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            messages: Vec::new(),
            k,
            last_route: None,
            citations: Vec::new(),
            error: None,
            memory: ConversationMemory::new(memory_config),
        }
    }

    /// Build a session from an incoming request, seeding the transcript
    /// and memory from the request's messages.
    pub fn from_request(request: &TurnRequest, default_k: usize, memory_config: MemoryConfig) -> Self {
        let mut state = Self::new(request.k.unwrap_or(default_k).max(1), memory_config);
        for message in &request.messages {
            state.push_message(message.clone());
        }
        state
    }

    /// Append a message and feed it into memory, scoring importance from
    /// the message itself.
    pub fn push_message(&mut self, message: Message) {
        let importance = score_importance(&message);
        self.memory
            .record(message.content.clone(), importance, message.role.to_string());
        self.messages.push(message);
    }

    /// Convenience for appending a role/content pair.
    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.push_message(Message::new(role, content));
    }

    /// The most recent user message, trimmed. `None` when the transcript
    /// holds no user message with non-whitespace content.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.trim())
            .filter(|c| !c.is_empty())
    }

    /// Apply a turn's delta. The message appends, citations are replaced,
    /// the route token overwrites, and the error slot is set from the
    /// delta (clearing any stale error on success).
    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(message) = delta.message {
            self.push_message(message);
        }
        self.citations = delta.citations;
        if delta.last_route.is_some() {
            self.last_route = delta.last_route;
        }
        self.error = delta.error;
    }

    /// Snapshot the state into a wire response.
    pub fn to_response(&self) -> TurnResponse {
        TurnResponse {
            messages: self.messages.clone(),
            citations: self.citations.clone(),
            last_route: self.last_route.clone(),
        }
    }
}

/// Importance heuristic for memory admission.
///
/// System instructions, cited answers, and subject-fact answers clear the
/// long-term admission threshold, as do substantive user questions.
/// Small talk and recovered-failure apologies stay short-term only.
fn score_importance(message: &Message) -> f64 {
    let mut score: f64 = match message.role {
        Role::System => 0.8,
        Role::User => 0.4,
        Role::Assistant => 0.2,
    };

    let meta = &message.metadata;
    let cited = meta
        .get("citations")
        .and_then(Value::as_array)
        .is_some_and(|c| !c.is_empty());
    let subject_fact = meta.get("node").and_then(Value::as_str) == Some("subject_info");
    if meta.get("error").is_none() && (cited || subject_fact) {
        score += 0.5;
    }

    if message.role == Role::User && message.content.chars().count() >= 30 {
        score += 0.3;
    }

    score.clamp(0.0, 1.0)
}

// =============================================================================
// Tests
// =============================================================================
