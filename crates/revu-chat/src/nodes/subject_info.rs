//! Fact-lookup composer backed by the subject database.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use revu_core::types::Route;
use revu_llm::CompletionService;

use crate::nodes::{failure_delta, plain_delta, Composer};
use crate::prompt::{build_subject_prompt, SUBJECT_SYSTEM_PROMPT};
use crate::state::{ConversationState, StateDelta};
use crate::subjects::SubjectDb;

const CLARIFY: &str = "어떤 작품인지 알려줘!";
const NO_INFO: &str = "정보를 찾을 수 없습니다.";

/// Composer that answers strictly from a subject's structured facts.
pub struct SubjectInfoComposer {
    llm: Arc<dyn CompletionService>,
    subjects: Arc<SubjectDb>,
}

impl SubjectInfoComposer {
    pub fn new(llm: Arc<dyn CompletionService>, subjects: Arc<SubjectDb>) -> Self {
        Self { llm, subjects }
    }
}

#[async_trait]
impl Composer for SubjectInfoComposer {
    fn route(&self) -> Route {
        Route::SubjectInfo
    }

    async fn compose(&self, question: &str, _state: &ConversationState) -> StateDelta {
        let Some((name, info)) = self.subjects.find(question) else {
            // Ambiguous subject: ask for clarification instead of guessing.
            return plain_delta(Route::SubjectInfo, CLARIFY.to_string());
        };

        let subject_json = match serde_json::to_string(&info.to_prompt_json()) {
            Ok(json) => json,
            Err(e) => {
                return failure_delta(
                    Route::SubjectInfo,
                    fallback_suggestion(name, info.title.as_deref()),
                    e.to_string(),
                );
            }
        };
        let prompt = build_subject_prompt(question, &subject_json);

        match self
            .llm
            .complete_with_system(SUBJECT_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(completion) => {
                let answer = completion.text.trim();
                let answer = if answer.is_empty() { NO_INFO } else { answer };
                plain_delta(Route::SubjectInfo, answer.to_string())
            }
            Err(e) => {
                warn!(subject = %name, error = %e, "Subject info completion failed");
                failure_delta(
                    Route::SubjectInfo,
                    fallback_suggestion(name, info.title.as_deref()),
                    e.to_string(),
                )
            }
        }
    }
}

fn fallback_suggestion(name: &str, title: Option<&str>) -> String {
    let title = title.unwrap_or(name);
    format!("죄송합니다. 잠시 문제가 생겼어요. 『{title}』에 대해 더 구체적으로 물어봐 주세요.")
}

// =============================================================================
// Tests
// =============================================================================
