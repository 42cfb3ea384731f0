//! General chat composer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use revu_core::types::{Message, Role, Route};
use revu_llm::CompletionService;

use crate::nodes::{failure_delta, plain_delta, Composer};
use crate::prompt::{build_chat_prompt, CHAT_SYSTEM_PROMPT};
use crate::state::{ConversationState, StateDelta};

const GREETING: &str = "안녕하세요! 저는 도서 리뷰 분석 어시스턴트입니다. 무엇을 도와드릴까요?";
const APOLOGY: &str = "죄송합니다. 일시적인 오류가 발생했어요. 잠시 후 다시 시도해주세요.";
const EMPTY_REPLY: &str = "(응답 없음)";

/// Composer for turns with no retrieval or fact lookup.
pub struct ChatComposer {
    llm: Arc<dyn CompletionService>,
    memory_summary_entries: usize,
}

impl ChatComposer {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self {
            llm,
            memory_summary_entries: 6,
        }
    }
}

#[async_trait]
impl Composer for ChatComposer {
    fn route(&self) -> Route {
        Route::Chat
    }

    async fn compose(&self, question: &str, state: &ConversationState) -> StateDelta {
        // An empty question means the turn carried no real user input.
        // Greet without spending a model call.
        if question.trim().is_empty() {
            return plain_delta(Route::Chat, GREETING.to_string());
        }

        // The current question is already the transcript's tail; keep it
        // out of the history window so the prompt carries it once.
        let mut history: &[Message] = &state.messages;
        if let Some((last, rest)) = history.split_last() {
            if last.role == Role::User && last.content.trim() == question {
                history = rest;
            }
        }

        let memory_summary = state.memory.summary(self.memory_summary_entries);
        let prompt = build_chat_prompt(history, &memory_summary, question);

        match self.llm.complete_with_system(CHAT_SYSTEM_PROMPT, &prompt).await {
            Ok(completion) => {
                let answer = completion.text.trim();
                let answer = if answer.is_empty() { EMPTY_REPLY } else { answer };
                plain_delta(Route::Chat, answer.to_string())
            }
            Err(e) => {
                warn!(error = %e, "Chat completion failed");
                failure_delta(Route::Chat, APOLOGY.to_string(), e.to_string())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use revu_core::config::MemoryConfig;
    use revu_llm::{FailingCompletion, MockCompletion};

    fn make_state() -> ConversationState {
        ConversationState::new(4, MemoryConfig::default())
    }

    #[tokio::test]
    async fn test_empty_question_greets_without_llm() {
        let llm = Arc::new(MockCompletion::always("should not be called"));
        let composer = ChatComposer::new(llm.clone());
        let delta = composer.compose("   ", &make_state()).await;

        assert_eq!(llm.call_count(), 0);
        assert!(delta.message.unwrap().content.contains("안녕하세요"));
        assert_eq!(delta.last_route.as_deref(), Some("chat"));
    }

    #[tokio::test]
    async fn test_answers_from_llm() {
        let llm = Arc::new(MockCompletion::always("반갑습니다!"));
        let composer = ChatComposer::new(llm);
        let delta = composer.compose("안녕", &make_state()).await;

        assert_eq!(delta.message.unwrap().content, "반갑습니다!");
        assert!(delta.citations.is_empty());
        assert!(delta.error.is_none());
    }

    #[tokio::test]
    async fn test_blank_completion_replaced() {
        let llm = Arc::new(MockCompletion::always("   "));
        let composer = ChatComposer::new(llm);
        let delta = composer.compose("안녕", &make_state()).await;
        assert_eq!(delta.message.unwrap().content, EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_llm_failure_yields_apology() {
        let composer = ChatComposer::new(Arc::new(FailingCompletion::new()));
        let delta = composer.compose("안녕", &make_state()).await;

        assert!(delta.message.unwrap().content.contains("죄송"));
        assert_eq!(delta.last_route.as_deref(), Some("chat:error"));
        assert_eq!(delta.error.unwrap().node, "chat");
    }

    #[tokio::test]
    async fn test_history_fed_to_prompt() {
        let mut state = make_state();
        state.add_message(Role::User, "처음 질문");
        state.add_message(Role::Assistant, "처음 답변");

        let llm = Arc::new(MockCompletion::always("이어지는 답변"));
        let composer = ChatComposer::new(llm.clone());
        let delta = composer.compose("그 다음은?", &state).await;

        assert_eq!(llm.call_count(), 1);
        assert!(delta.message.is_some());
    }
}
