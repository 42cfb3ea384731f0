//! Turn orchestration: router → one composer → done.
//!
//! The state machine is `START → router → {chat | subject_info |
//! rag_review} → END`. Exactly one composer runs per turn and a turn
//! never re-enters the router, so every turn appends exactly one
//! assistant message. Routing failures degrade to the chat route; a turn
//! is never blocked on classification.

use std::sync::Arc;

use tracing::{info, warn};

use revu_core::config::{MemoryConfig, RetrievalConfig};
use revu_core::types::{Route, TurnRequest, TurnResponse};
use revu_llm::CompletionService;
use revu_retrieval::DocumentRetriever;

use crate::nodes::{ChatComposer, Composer, RagReviewComposer, SubjectInfoComposer};
use crate::router::IntentRouter;
use crate::state::ConversationState;
use crate::subjects::SubjectDb;

/// Wires the router and the three composers over shared services.
///
/// Services are constructed once at bootstrap and injected; the
/// orchestrator owns no lazy global state.
pub struct GraphOrchestrator {
    router: IntentRouter,
    chat: ChatComposer,
    subject_info: SubjectInfoComposer,
    rag_review: RagReviewComposer,
    default_k: usize,
    memory_config: MemoryConfig,
}

impl GraphOrchestrator {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        retriever: Arc<dyn DocumentRetriever>,
        subjects: Arc<SubjectDb>,
        retrieval_config: &RetrievalConfig,
        memory_config: MemoryConfig,
    ) -> Self {
        Self {
            router: IntentRouter::new(llm.clone()),
            chat: ChatComposer::new(llm.clone()),
            subject_info: SubjectInfoComposer::new(llm.clone(), subjects),
            rag_review: RagReviewComposer::new(
                llm,
                retriever,
                retrieval_config.context_max_chars,
            ),
            default_k: retrieval_config.k,
            memory_config,
        }
    }

    /// Run one turn against a session's state. Returns the route that
    /// produced the assistant message.
    pub async fn run_turn(&self, state: &mut ConversationState) -> Route {
        let question = state
            .last_user_message()
            .map(str::to_string)
            .unwrap_or_default();

        // Empty turn short-circuits to chat without a classification call.
        let route = if question.is_empty() {
            Route::Chat
        } else {
            match self.router.decide_route(&question).await {
                Ok(route) => route,
                Err(e) => {
                    warn!(error = %e, "Routing failed, defaulting to chat");
                    Route::Chat
                }
            }
        };

        let composer: &dyn Composer = match route {
            Route::Chat => &self.chat,
            Route::SubjectInfo => &self.subject_info,
            Route::RagReview => &self.rag_review,
        };

        let delta = composer.compose(&question, state).await;
        state.apply(delta);
        info!(
            session = %state.session_id,
            route = %route,
            last_route = state.last_route.as_deref().unwrap_or(""),
            "Turn completed"
        );
        route
    }

    /// Serve a stateless turn request: seed a session from the request's
    /// transcript, run one turn, and snapshot the result.
    pub async fn handle_request(&self, request: &TurnRequest) -> TurnResponse {
        let mut state =
            ConversationState::from_request(request, self.default_k, self.memory_config.clone());
        self.run_turn(&mut state).await;
        state.to_response()
    }
}

// =============================================================================
// Tests
// =============================================================================
