//! Review-grounded composer.
//!
//! Retrieves the top-k review snippets for the question, formats them
//! into a capped context block, and asks the model to answer strictly
//! from that block with snippet citations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use revu_core::types::{Citation, Message, Role, Route};
use revu_llm::CompletionService;
use revu_retrieval::DocumentRetriever;

use crate::nodes::{failure_delta, plain_delta, Composer};
use crate::prompt::{build_review_prompt, format_docs};
use crate::state::{ConversationState, StateDelta};

const DEFAULT_K: usize = 4;
const NOT_FOUND: &str = "리뷰에서 답을 찾을 수 없습니다.";
const APOLOGY: &str = "리뷰 분석 처리 중 오류가 발생했어요. 잠시 후 다시 시도해주세요.";

/// Composer for answers grounded in retrieved review snippets.
pub struct RagReviewComposer {
    llm: Arc<dyn CompletionService>,
    retriever: Arc<dyn DocumentRetriever>,
    context_max_chars: usize,
}

impl RagReviewComposer {
    pub fn new(
        llm: Arc<dyn CompletionService>,
        retriever: Arc<dyn DocumentRetriever>,
        context_max_chars: usize,
    ) -> Self {
        Self {
            llm,
            retriever,
            context_max_chars,
        }
    }
}

#[async_trait]
impl Composer for RagReviewComposer {
    fn route(&self) -> Route {
        Route::RagReview
    }

    async fn compose(&self, question: &str, state: &ConversationState) -> StateDelta {
        let k = if state.k > 0 { state.k } else { DEFAULT_K };

        let docs = match self.retriever.retrieve(question, k).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(error = %e, "Review retrieval failed");
                return failure_delta(Route::RagReview, APOLOGY.to_string(), e.to_string());
            }
        };

        // Nothing retrieved: refuse explicitly instead of letting the
        // model fabricate an answer.
        if docs.is_empty() {
            return plain_delta(Route::RagReview, NOT_FOUND.to_string());
        }

        let citations: Vec<Citation> = docs
            .iter()
            .map(|d| Citation {
                source_id: d.source().to_string(),
                score: Some(d.score),
                metadata: d.metadata.clone(),
            })
            .collect();

        let context = format_docs(&docs, self.context_max_chars);
        debug!(
            retriever = self.retriever.name(),
            docs = docs.len(),
            context_chars = context.chars().count(),
            "Composing review answer"
        );
        let prompt = build_review_prompt(question, &context);

        match self.llm.complete(&prompt).await {
            Ok(completion) => {
                let answer = completion.text.trim();
                let answer = if answer.is_empty() { NOT_FOUND } else { answer };
                let message = Message::with_metadata(
                    Role::Assistant,
                    answer,
                    serde_json::json!({
                        "node": Route::RagReview.token(),
                        "citations": citations,
                    }),
                );
                StateDelta {
                    message: Some(message),
                    citations,
                    last_route: Some(Route::RagReview.token().to_string()),
                    error: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Review completion failed");
                failure_delta(Route::RagReview, APOLOGY.to_string(), e.to_string())
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
    use revu_retrieval::{CorpusDocument, LexicalRetriever};

    fn make_state() -> ConversationState {
        ConversationState::new(4, MemoryConfig::default())
    }

    fn review_corpus() -> Vec<CorpusDocument> {
        vec![
            CorpusDocument {
                text: "정말 감동적인 결말이었다".into(),
                metadata: serde_json::json!({ "source": "yes24" }),
            },
            CorpusDocument {
                text: "배송이 빨랐어요".into(),
                metadata: serde_json::json!({ "source": "aladin" }),
            },
        ]
    }

    fn lexical(docs: Vec<CorpusDocument>) -> Arc<dyn DocumentRetriever> {
        Arc::new(LexicalRetriever::new(docs, 5000))
    }

    #[tokio::test]
    async fn test_grounded_answer_carries_citations() {
        let llm = Arc::new(MockCompletion::always("결말이 감동적이라는 평이 많습니다.\n출처: [DOC 1]"));
        let composer = RagReviewComposer::new(llm, lexical(review_corpus()), 1400);
        let delta = composer.compose("결말에 대한 평가는?", &make_state()).await;

        assert!(!delta.citations.is_empty());
        assert_eq!(delta.citations[0].source_id, "yes24");
        assert_eq!(delta.last_route.as_deref(), Some("rag_review"));
        assert!(delta.error.is_none());
    }

    #[tokio::test]
    async fn test_empty_retrieval_refuses_without_llm() {
        let llm = Arc::new(MockCompletion::always("unused"));
        let composer = RagReviewComposer::new(llm.clone(), lexical(Vec::new()), 1400);
        let delta = composer.compose("결말 어때?", &make_state()).await;

        assert_eq!(llm.call_count(), 0);
        assert!(delta.message.unwrap().content.contains("찾을 수 없습니다"));
        assert!(delta.citations.is_empty());
        assert!(delta.error.is_none());
    }

    #[tokio::test]
    async fn test_llm_failure_yields_apology_and_error_token() {
        let composer = RagReviewComposer::new(
            Arc::new(FailingCompletion::new()),
            lexical(review_corpus()),
            1400,
        );
        let delta = composer.compose("결말에 대한 평가는?", &make_state()).await;

        assert!(delta.message.unwrap().content.contains("오류"));
        assert_eq!(delta.last_route.as_deref(), Some("rag_review:error"));
        assert_eq!(delta.error.unwrap().node, "rag_review");
        assert!(delta.citations.is_empty());
    }

    #[tokio::test]
    async fn test_k_bounds_retrieved_docs() {
        let llm = Arc::new(MockCompletion::always("요약"));
        let composer = RagReviewComposer::new(llm, lexical(review_corpus()), 1400);
        let mut state = make_state();
        state.k = 1;
        let delta = composer.compose("결말에 대한 평가는?", &state).await;
        assert_eq!(delta.citations.len(), 1);
    }

    #[tokio::test]
    async fn test_message_metadata_records_node_and_citations() {
        let llm = Arc::new(MockCompletion::always("요약\n출처: [DOC 1]"));
        let composer = RagReviewComposer::new(llm, lexical(review_corpus()), 1400);
        let delta = composer.compose("결말에 대한 평가는?", &make_state()).await;

        let message = delta.message.unwrap();
        assert_eq!(message.metadata["node"], "rag_review");
        assert!(message.metadata["citations"].is_array());
    }
}
