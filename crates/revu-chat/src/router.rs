//! LLM-backed intent routing with deterministic keyword fallback.
//!
//! The classification prompt constrains the model to one of three route
//! tokens. Model output is unreliable in practice, so the decision goes
//! through a ladder: exact token match, marker-substring scan over the
//! normalized output, the same scan over the raw question, then `chat`.

use std::sync::Arc;

use tracing::debug;

use revu_core::types::Route;
use revu_llm::CompletionService;

use crate::error::{ChatError, Result};

// Marker lists overlap across languages on purpose: the model sometimes
// answers in Korean prose instead of a bare token. Subject markers are
// checked before review markers.
const SUBJECT_MARKERS: &[&str] = &[
    "subject_info",
    "subjectinfo",
    "subject",
    "정보",
    "스펙",
    "특징",
    "저자",
    "작가",
    "제조사",
    "소개",
    "설명",
];

const REVIEW_MARKERS: &[&str] = &[
    "rag_review",
    "ragreview",
    "rag",
    "review",
    "리뷰",
    "후기",
    "요약",
    "인용",
];

// Extra marker applied only when scanning the question itself.
const QUESTION_SUBJECT_MARKERS: &[&str] = &["가격"];

/// Classifies the latest user question into a [`Route`].
pub struct IntentRouter {
    llm: Arc<dyn CompletionService>,
}

impl IntentRouter {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    /// Decide the route for a question.
    ///
    /// Model failures propagate as [`ChatError::Routing`]; the caller is
    /// expected to fall back to [`Route::Chat`] so a turn always makes
    /// progress.
    pub async fn decide_route(&self, question: &str) -> Result<Route> {
        let prompt = build_routing_prompt(question);
        let completion = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| ChatError::Routing(e.to_string()))?;

        let decision = normalize_decision(&completion.text);
        debug!(raw = %completion.text.trim(), normalized = %decision, "Routing decision");

        if let Some(route) = Route::from_token(&decision) {
            return Ok(route);
        }
        if let Some(route) = scan_markers(&decision, false) {
            return Ok(route);
        }
        if let Some(route) = scan_markers(&question.to_lowercase(), true) {
            return Ok(route);
        }
        Ok(Route::Chat)
    }
}

fn build_routing_prompt(question: &str) -> String {
    format!(
        "너는 라우팅 판단자다. 사용자의 질문이 어떤 처리로 가야 할지 '정확히 하나'만 선택해라.\n\
         가능한 선택지(영문 토큰만 출력): chat | subject_info | rag_review\n\
         규칙:\n\
         - 대상(제품/작품/인물)의 기본 정보/스펙/설명/저자/제조사 등을 물으면 subject_info\n\
         - 리뷰/후기/요약/인용 등 사용자 반응을 근거로 한 답변이 필요하면 rag_review\n\
         - 그 외 일반 대화는 chat\n\
         출력 형식: 위 토큰 중 하나만 단독으로 출력 (예: rag_review)\n\n\
         질문: {question}\n\
         답변:"
    )
}

/// Lowercase, strip all whitespace, and trim surrounding quotes.
fn normalize_decision(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

/// Scan for route marker substrings, subject markers first.
fn scan_markers(text: &str, include_question_markers: bool) -> Option<Route> {
    let subject_hit = SUBJECT_MARKERS.iter().any(|m| text.contains(m))
        || (include_question_markers
            && QUESTION_SUBJECT_MARKERS.iter().any(|m| text.contains(m)));
    if subject_hit {
        return Some(Route::SubjectInfo);
    }
    if REVIEW_MARKERS.iter().any(|m| text.contains(m)) {
        return Some(Route::RagReview);
    }
    None
}

// =============================================================================
// Tests
// =============================================================================
