//! Retriever contract and construction-time backend selection.
//!
//! Both retriever variants stand behind one contract: `retrieve(query, k)`
//! returns at most `k` documents, descending by score. `build_retriever`
//! probes the preferred dense backend at construction and falls back to the
//! lexical variant when the embedding service is unusable; the fallback is
//! a degraded-mode event, never a fatal error.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use revu_core::error::Result;
use revu_core::types::RetrievedDocument;

use crate::corpus::CorpusDocument;
use crate::dense::DenseRetriever;
use crate::embedding::DynEmbeddingService;
use crate::lexical::LexicalRetriever;

/// Ranked snippet retrieval over a fixed corpus.
#[async_trait]
pub trait DocumentRetriever: Send + Sync {
    /// Return up to `k` documents relevant to `query`, descending by score.
    ///
    /// An empty query or empty corpus yields an empty result, never an error.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>>;

    /// Short backend name for logs ("lexical" / "dense").
    fn name(&self) -> &'static str;
}

/// Dense-backend parameters for [`build_retriever`].
pub struct DenseBackend {
    pub embedder: Box<dyn DynEmbeddingService>,
    /// Model identifier recorded in (and checked against) the persisted index.
    pub model: String,
    /// Directory holding the persisted index.
    pub index_dir: std::path::PathBuf,
}

impl DenseBackend {
    pub fn new(
        embedder: Box<dyn DynEmbeddingService>,
        model: impl Into<String>,
        index_dir: impl Into<std::path::PathBuf>,
    ) -> Self {
        Self {
            embedder,
            model: model.into(),
            index_dir: index_dir.into(),
        }
    }
}

/// Build the process-wide retriever, preferring the dense backend.
///
/// The dense build exercises the embedding service end to end (corpus
/// encoding, or a persisted-index load); any failure selects the lexical
/// variant instead, logged as a degraded-mode warning. The returned value
/// is intended to be constructed once at bootstrap and shared for the
/// process lifetime.
pub async fn build_retriever(
    docs: Vec<CorpusDocument>,
    max_features: usize,
    dense: Option<DenseBackend>,
) -> Arc<dyn DocumentRetriever> {
    if let Some(backend) = dense {
        match DenseRetriever::open_or_build(
            Path::new(&backend.index_dir),
            docs.clone(),
            backend.embedder,
            &backend.model,
        )
        .await
        {
            Ok(retriever) => {
                info!(count = retriever.len(), model = %backend.model, "Using dense retriever");
                return Arc::new(retriever);
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Dense retriever unavailable; falling back to lexical retriever (degraded mode)"
                );
            }
        }
    }

    let retriever = LexicalRetriever::new(docs, max_features);
    info!(
        count = retriever.len(),
        vocabulary = retriever.vocabulary_size(),
        "Using lexical retriever"
    );
    Arc::new(retriever)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{FailingEmbedding, MockEmbedding};

    fn doc(text: &str, source: &str) -> CorpusDocument {
        CorpusDocument::new(text, serde_json::json!({ "source": source }))
    }

    fn corpus() -> Vec<CorpusDocument> {
        vec![
            doc("정말 감동적인 결말이었다", "yes24"),
            doc("문장이 아름답다", "aladin"),
        ]
    }

    #[tokio::test]
    async fn test_build_prefers_dense() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DenseBackend::new(
            Box::new(MockEmbedding::with_dimensions(32)),
            "mock-model",
            dir.path(),
        );
        let retriever = build_retriever(corpus(), 5000, Some(backend)).await;
        assert_eq!(retriever.name(), "dense");
    }

    #[tokio::test]
    async fn test_embedding_failure_falls_back_to_lexical() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DenseBackend::new(Box::new(FailingEmbedding), "mock-model", dir.path());
        let retriever = build_retriever(corpus(), 5000, Some(backend)).await;
        assert_eq!(retriever.name(), "lexical");

        // The degraded retriever still serves queries.
        let docs = retriever.retrieve("결말", 2).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].metadata["source"], "yes24");
    }

    #[tokio::test]
    async fn test_no_dense_backend_uses_lexical() {
        let retriever = build_retriever(corpus(), 5000, None).await;
        assert_eq!(retriever.name(), "lexical");
    }

    #[tokio::test]
    async fn test_fallback_with_empty_corpus_returns_empty_results() {
        let dir = tempfile::tempdir().unwrap();
        let backend = DenseBackend::new(Box::new(FailingEmbedding), "mock-model", dir.path());
        let retriever = build_retriever(vec![], 5000, Some(backend)).await;
        let docs = retriever.retrieve("질문", 4).await.unwrap();
        assert!(docs.is_empty());
    }
}
