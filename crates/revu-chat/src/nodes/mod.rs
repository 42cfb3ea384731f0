//! Answer composers, one per route.
//!
//! A composer turns the current question plus conversation state into a
//! [`StateDelta`] carrying exactly one assistant message. Failures are
//! handled inside the composer: the delta then carries an apologetic
//! message, an error record, and a `<route>:error` route token. Composers
//! never return errors to the orchestrator.

use async_trait::async_trait;

use revu_core::types::{Message, Role, Route};

use crate::state::{ConversationState, NodeError, StateDelta};

mod chat;
mod rag_review;
mod subject_info;

pub use chat::ChatComposer;
pub use rag_review::RagReviewComposer;
pub use subject_info::SubjectInfoComposer;

/// Produces the assistant answer for one route.
#[async_trait]
pub trait Composer: Send + Sync {
    /// The route this composer serves.
    fn route(&self) -> Route;

    /// Compose the turn's answer. Infallible by contract: failures are
    /// folded into the returned delta.
    async fn compose(&self, question: &str, state: &ConversationState) -> StateDelta;
}

/// Delta for a successful, uncited answer.
fn plain_delta(route: Route, content: String) -> StateDelta {
    let message = Message::with_metadata(
        Role::Assistant,
        content,
        serde_json::json!({ "node": route.token() }),
    );
    StateDelta {
        message: Some(message),
        citations: Vec::new(),
        last_route: Some(route.token().to_string()),
        error: None,
    }
}

/// Delta for an internally-handled failure: apology message, error
/// record, and the route's error token.
fn failure_delta(route: Route, apology: String, detail: String) -> StateDelta {
    let message = Message::with_metadata(
        Role::Assistant,
        apology,
        serde_json::json!({ "node": route.token(), "error": detail }),
    );
    StateDelta {
        message: Some(message),
        citations: Vec::new(),
        last_route: Some(route.error_token()),
        error: Some(NodeError::new(route.token(), detail)),
    }
}
