//! Shared domain types for the Revu pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A single conversation message.
///
/// Messages are append-only within a turn; they are never reordered or
/// mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Node-specific metadata (producing node, citations, error detail).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl Message {
    /// Create a message with no metadata.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: Value::Null,
        }
    }

    /// Create a message carrying metadata.
    pub fn with_metadata(role: Role, content: impl Into<String>, metadata: Value) -> Self {
        Self {
            role,
            content: content.into(),
            metadata,
        }
    }
}

/// The selected handling path for a conversational turn.
///
/// Routing decisions are always one of these three variants; the recorded
/// `last_route` string may additionally carry an `:error` suffix when a
/// composer recovered from an internal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Chat,
    SubjectInfo,
    RagReview,
}

impl Route {
    /// The wire token for this route.
    pub fn token(&self) -> &'static str {
        match self {
            Route::Chat => "chat",
            Route::SubjectInfo => "subject_info",
            Route::RagReview => "rag_review",
        }
    }

    /// The `last_route` value recorded when this route's composer failed
    /// internally but still produced a fallback answer.
    pub fn error_token(&self) -> String {
        format!("{}:error", self.token())
    }

    /// Parse an exact route token.
    pub fn from_token(s: &str) -> Option<Route> {
        match s {
            "chat" => Some(Route::Chat),
            "subject_info" => Some(Route::SubjectInfo),
            "rag_review" => Some(Route::RagReview),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A reference to the source snippet that grounded an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Identifier of the source (site or file the snippet came from).
    pub source_id: String,
    /// Relevance score reported by the retriever, if any.
    pub score: Option<f64>,
    /// Raw snippet metadata.
    pub metadata: Value,
}

/// A text snippet returned by a retriever.
///
/// Produced fresh per query and never mutated. The score scale is
/// retriever-specific (cosine similarity or inner product); higher is more
/// relevant, but scores are not comparable across retriever implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Snippet content; retrievers never emit empty text.
    pub text: String,
    /// Metadata including at least `source`, optionally `date` and `rating`.
    pub metadata: Value,
    /// Relevance score; higher is more relevant.
    pub score: f64,
}

impl RetrievedDocument {
    /// The `source` metadata field, or `"unknown"` when absent.
    pub fn source(&self) -> &str {
        self.metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
    }
}

/// Turn-level request shape consumed by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub messages: Vec<Message>,
    /// Number of snippets to retrieve for retrieval-grounded routes.
    #[serde(default)]
    pub k: Option<usize>,
}

/// Turn-level response: the request messages augmented with the new
/// assistant message, plus citations and the recorded route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub messages: Vec<Message>,
    pub citations: Vec<Citation>,
    pub last_route: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_tokens() {
        assert_eq!(Route::Chat.token(), "chat");
        assert_eq!(Route::SubjectInfo.token(), "subject_info");
        assert_eq!(Route::RagReview.token(), "rag_review");
    }

    #[test]
    fn test_route_error_token() {
        assert_eq!(Route::RagReview.error_token(), "rag_review:error");
        assert_eq!(Route::SubjectInfo.error_token(), "subject_info:error");
    }

    #[test]
    fn test_route_from_token() {
        assert_eq!(Route::from_token("chat"), Some(Route::Chat));
        assert_eq!(Route::from_token("subject_info"), Some(Route::SubjectInfo));
        assert_eq!(Route::from_token("rag_review"), Some(Route::RagReview));
        assert_eq!(Route::from_token("review"), None);
        assert_eq!(Route::from_token(""), None);
    }

    #[test]
    fn test_route_serde_snake_case() {
        let json = serde_json::to_string(&Route::SubjectInfo).unwrap();
        assert_eq!(json, "\"subject_info\"");
        let parsed: Route = serde_json::from_str("\"rag_review\"").unwrap();
        assert_eq!(parsed, Route::RagReview);
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_message_without_metadata_skips_field() {
        let msg = Message::new(Role::User, "안녕하세요");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn test_message_with_metadata() {
        let msg = Message::with_metadata(
            Role::Assistant,
            "answer",
            serde_json::json!({"node": "rag_review"}),
        );
        assert_eq!(msg.metadata["node"], "rag_review");
    }

    #[test]
    fn test_retrieved_document_source() {
        let doc = RetrievedDocument {
            text: "정말 감동적인 결말이었다".to_string(),
            metadata: serde_json::json!({"source": "yes24"}),
            score: 0.9,
        };
        assert_eq!(doc.source(), "yes24");

        let doc = RetrievedDocument {
            text: "text".to_string(),
            metadata: serde_json::json!({}),
            score: 0.1,
        };
        assert_eq!(doc.source(), "unknown");
    }

    #[test]
    fn test_turn_request_k_defaults_to_none() {
        let req: TurnRequest =
            serde_json::from_str(r#"{"messages":[{"role":"user","content":"hi"}]}"#).unwrap();
        assert!(req.k.is_none());
        assert_eq!(req.messages.len(), 1);
    }
}
