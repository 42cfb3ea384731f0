//! Prompt construction for the three answer routes.
//!
//! All user-facing prompts are Korean; the assistant serves Korean book
//! review analysis.

use revu_core::types::{Message, RetrievedDocument, Role};

/// Number of recent transcript messages included in the chat prompt.
pub const HISTORY_WINDOW: usize = 10;

/// System instruction for the general chat route.
pub const CHAT_SYSTEM_PROMPT: &str = "당신은 도서 리뷰 분석 비서입니다. \
실제 독자 리뷰 데이터를 바탕으로 한국어로 자연스럽게 답변합니다. \
모르면 단정하지 말고, 필요한 경우 명확화 질문을 1개 이내로 하세요.";

/// System instruction for the subject-info route. Grounds the answer
/// strictly in the supplied JSON fact record and forces an explicit
/// 네/아니요 prefix on yes-no questions.
pub const SUBJECT_SYSTEM_PROMPT: &str = "너는 책 정보 전용 어시스턴트다. 아래 JSON만 근거로 답하라. 추측 금지.\n\
1) 질문이 예/아니오형이면 반드시 다음 형식 중 하나로 시작하라:\n\
   - '네, ...입니다.'  (주장이 JSON과 일치할 때)\n\
   - '아니요, ...입니다.' (주장이 JSON과 다를 때)\n\
   이어지는 설명도 JSON 근거로만, 질문한 항목(필드)만 간단히 말하라.\n\
2) 예/아니오형이 아니면, 질문에서 필요한 슬롯만 간결히 한 문단으로 답하라.\n\
3) 절대 JSON에 없는 정보/수상/해설을 덧붙이지 말라. 불확실하면 생략.\n\
4) 숫자/날짜/쪽수/장르/수상/언어 등은 JSON 값과 정확히 일치시켜 서술하라.";

const SUBJECT_SLOTS: &str =
    "title, author, publisher, published_date, summary, pages, genres, awards, language";

/// Build the user prompt for the chat route: bounded history window,
/// optional memory summary, then the current question.
pub fn build_chat_prompt(history: &[Message], memory_summary: &str, question: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !memory_summary.is_empty() {
        parts.push(format!("이전 대화에서 기억할 내용:\n{}", memory_summary));
    }

    let window = history
        .iter()
        .rev()
        .take(HISTORY_WINDOW)
        .collect::<Vec<_>>();
    if !window.is_empty() {
        let mut lines = Vec::with_capacity(window.len());
        for message in window.into_iter().rev() {
            let prefix = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::System => "System",
            };
            lines.push(format!("{}: {}", prefix, message.content));
        }
        parts.push(format!("대화 히스토리:\n{}", lines.join("\n")));
    }

    parts.push(format!("User: {}\nAssistant:", question));
    parts.join("\n\n")
}

/// Build the user prompt for the subject-info route from a question and
/// the subject's fact record serialized as JSON.
pub fn build_subject_prompt(question: &str, subject_json: &str) -> String {
    format!(
        "질문: {question}\n\n\
         책 정보(JSON):\n{subject_json}\n\n\
         도움말:\n- 가능한 키: {SUBJECT_SLOTS}\n\
         - 질문이 예/아니오인지 스스로 판단하라.\n\
         - 예/아니오라면 위 규칙에 맞는 한두 문장만 출력.\n\
         - 일반 질문이면 관련 슬롯만 간결히 요약.\n\
         - 출력은 한국어로만."
    )
}

/// Build the review-grounded prompt: answer strictly from the context
/// block and close with a `출처: [DOC i, ...]` citation line.
pub fn build_review_prompt(question: &str, context: &str) -> String {
    format!(
        "당신은 도서 리뷰를 기반으로 사실적인 요약과 근거 인용을 제공하는 어시스턴트입니다.\n\
         아래 CONTEXT에서만 근거를 취해 답하세요.\n\
         - 근거가 없으면 모른다고 답하세요.\n\
         - 핵심 요점 위주로 5문장 이내로 요약하세요.\n\n\
         QUESTION:\n{question}\n\n\
         CONTEXT:\n{context}\n\n\
         마지막 줄에 '출처: [DOC i, ...]' 형식으로 문서 번호를 기재하세요."
    )
}

/// Format retrieved snippets as a labeled context block, capped at
/// `max_chars`. Truncation keeps the head and appends an ellipsis marker.
pub fn format_docs(docs: &[RetrievedDocument], max_chars: usize) -> String {
    let chunks: Vec<String> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            format!(
                "[DOC {}]\nSOURCE: {}\nCONTENT: {}\n",
                i + 1,
                doc.source(),
                doc.text
            )
        })
        .collect();
    let context = chunks.join("\n\n");
    truncate_with_ellipsis(&context, max_chars)
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(text: &str, source: &str) -> RetrievedDocument {
        RetrievedDocument {
            text: text.to_string(),
            metadata: json!({ "source": source }),
            score: 0.5,
        }
    }

    #[test]
    fn test_format_docs_labels_and_sources() {
        let docs = vec![doc("첫 번째 리뷰", "yes24"), doc("두 번째 리뷰", "aladin")];
        let context = format_docs(&docs, 1400);
        assert!(context.contains("[DOC 1]"));
        assert!(context.contains("[DOC 2]"));
        assert!(context.contains("SOURCE: yes24"));
        assert!(context.contains("SOURCE: aladin"));
    }

    #[test]
    fn test_format_docs_caps_length_with_ellipsis() {
        let long = "가".repeat(3000);
        let context = format_docs(&[doc(&long, "yes24")], 100);
        assert!(context.ends_with("..."));
        assert_eq!(context.chars().count(), 100);
    }

    #[test]
    fn test_format_docs_short_context_untouched() {
        let context = format_docs(&[doc("짧은 리뷰", "yes24")], 1400);
        assert!(!context.ends_with("..."));
    }

    #[test]
    fn test_format_docs_empty() {
        assert!(format_docs(&[], 1400).is_empty());
    }

    #[test]
    fn test_review_prompt_demands_citation_line() {
        let prompt = build_review_prompt("결말 평가는?", "[DOC 1] ...");
        assert!(prompt.contains("QUESTION:\n결말 평가는?"));
        assert!(prompt.contains("출처: [DOC i, ...]"));
    }

    #[test]
    fn test_chat_prompt_bounds_history() {
        let history: Vec<Message> = (0..20)
            .map(|i| Message::new(Role::User, format!("message {}", i)))
            .collect();
        let prompt = build_chat_prompt(&history, "", "마지막 질문");
        assert!(prompt.contains("message 19"));
        assert!(prompt.contains("message 10"));
        assert!(!prompt.contains("message 9\n"));
        assert!(prompt.ends_with("Assistant:"));
    }

    #[test]
    fn test_chat_prompt_includes_memory_summary() {
        let prompt = build_chat_prompt(&[], "- (user) 좋아하는 장르는 SF", "추천해줘");
        assert!(prompt.contains("기억할 내용"));
        assert!(prompt.contains("SF"));
    }

    #[test]
    fn test_subject_prompt_embeds_json_and_slots() {
        let prompt = build_subject_prompt("저자가 누구야?", r#"{"author":"한강"}"#);
        assert!(prompt.contains(r#""author":"한강""#));
        assert!(prompt.contains("published_date"));
    }
}
