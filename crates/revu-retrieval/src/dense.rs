//! Dense vector retriever with on-disk persistence.
//!
//! Encodes the corpus once through an embedding service, L2-normalizes the
//! vectors, and ranks queries by inner product (equivalent to cosine on the
//! normalized vectors). The built index persists to an index directory:
//!
//! - `meta.json`  — item count, vector dimension, embedding model id
//! - `index.json` — the normalized vectors and their documents
//!
//! On construction a compatible on-disk index (same model, dimension, and
//! document count) is reused instead of re-embedding the corpus; anything
//! absent, unreadable, or incompatible triggers a rebuild.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use revu_core::error::{Result, RevuError};
use revu_core::types::RetrievedDocument;

use crate::corpus::CorpusDocument;
use crate::embedding::DynEmbeddingService;
use crate::retriever::DocumentRetriever;

const META_FILE: &str = "meta.json";
const INDEX_FILE: &str = "index.json";

/// Persisted index metadata used for compatibility checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Number of indexed documents.
    pub count: usize,
    /// Vector dimension.
    pub dim: usize,
    /// Embedding model identifier the vectors were produced with.
    pub model: String,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    vectors: Vec<Vec<f32>>,
    docs: Vec<CorpusDocument>,
}

/// Dense retriever over L2-normalized corpus embeddings.
pub struct DenseRetriever {
    docs: Vec<CorpusDocument>,
    vectors: Vec<Vec<f32>>,
    meta: IndexMeta,
    embedder: Box<dyn DynEmbeddingService>,
}

impl DenseRetriever {
    /// Embed and index the corpus from scratch.
    pub async fn build(
        docs: Vec<CorpusDocument>,
        embedder: Box<dyn DynEmbeddingService>,
        model: &str,
    ) -> Result<Self> {
        let texts: Vec<String> = docs.iter().map(|d| d.text.clone()).collect();
        let mut vectors = embedder.embed_batch_boxed(&texts).await?;
        for v in &mut vectors {
            normalize(v);
        }

        let dim = vectors
            .first()
            .map(|v| v.len())
            .unwrap_or_else(|| embedder.dimensions());

        info!(count = docs.len(), dim, model, "Dense index built");

        Ok(Self {
            meta: IndexMeta {
                count: docs.len(),
                dim,
                model: model.to_string(),
            },
            docs,
            vectors,
            embedder,
        })
    }

    /// Reuse a compatible persisted index, or build (and persist) a fresh one.
    ///
    /// Compatibility requires the stored model id, dimension, and document
    /// count to match the current corpus; a stale or unreadable index is
    /// rebuilt, never an error.
    pub async fn open_or_build(
        index_dir: &Path,
        docs: Vec<CorpusDocument>,
        embedder: Box<dyn DynEmbeddingService>,
        model: &str,
    ) -> Result<Self> {
        match Self::load(index_dir, docs.len(), model) {
            Ok((meta, stored)) => {
                info!(
                    count = meta.count,
                    dim = meta.dim,
                    model = %meta.model,
                    "Reusing persisted dense index"
                );
                Ok(Self {
                    meta,
                    docs: stored.docs,
                    vectors: stored.vectors,
                    embedder,
                })
            }
            Err(e) => {
                debug!(error = %e, "Persisted index unusable; rebuilding");
                let built = Self::build(docs, embedder, model).await?;
                if let Err(e) = built.persist(index_dir) {
                    // A read-only index directory should not stop the turn loop.
                    warn!(error = %e, "Failed to persist dense index");
                }
                Ok(built)
            }
        }
    }

    fn load(index_dir: &Path, corpus_len: usize, model: &str) -> Result<(IndexMeta, IndexFile)> {
        let meta_raw = std::fs::read_to_string(index_dir.join(META_FILE))?;
        let meta: IndexMeta = serde_json::from_str(&meta_raw)?;

        if meta.model != model {
            return Err(RevuError::Retrieval(format!(
                "index model mismatch: stored {}, configured {}",
                meta.model, model
            )));
        }
        if meta.count != corpus_len {
            return Err(RevuError::Retrieval(format!(
                "index count mismatch: stored {}, corpus {}",
                meta.count, corpus_len
            )));
        }

        let index_raw = std::fs::read_to_string(index_dir.join(INDEX_FILE))?;
        let stored: IndexFile = serde_json::from_str(&index_raw)?;

        if stored.vectors.len() != meta.count
            || stored.vectors.iter().any(|v| v.len() != meta.dim)
        {
            return Err(RevuError::Retrieval(
                "index file inconsistent with metadata".to_string(),
            ));
        }

        Ok((meta, stored))
    }

    /// Write the index and its metadata to the index directory.
    pub fn persist(&self, index_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(index_dir)?;
        let meta = serde_json::to_string(&self.meta)?;
        std::fs::write(index_dir.join(META_FILE), meta)?;

        let index = serde_json::to_string(&IndexFile {
            vectors: self.vectors.clone(),
            docs: self.docs.clone(),
        })?;
        std::fs::write(index_dir.join(INDEX_FILE), index)?;

        debug!(dir = %index_dir.display(), count = self.meta.count, "Dense index persisted");
        Ok(())
    }

    /// Index metadata (count, dimension, model).
    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[async_trait]
impl DocumentRetriever for DenseRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDocument>> {
        if query.trim().is_empty() || self.docs.is_empty() {
            return Ok(Vec::new());
        }

        let mut qvec = self.embedder.embed_boxed(query).await?;
        normalize(&mut qvec);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(&qvec, v)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| RetrievedDocument {
                text: self.docs[i].text.clone(),
                metadata: self.docs[i].metadata.clone(),
                score: score as f64,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "dense"
    }
}

fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedding;

    fn doc(text: &str, source: &str) -> CorpusDocument {
        CorpusDocument::new(text, serde_json::json!({ "source": source }))
    }

    fn corpus() -> Vec<CorpusDocument> {
        vec![
            doc("정말 감동적인 결말이었다", "yes24"),
            doc("문장이 아름답다", "aladin"),
            doc("무거운 주제를 다룬 작품", "kyobo"),
        ]
    }

    fn embedder() -> Box<dyn DynEmbeddingService> {
        Box::new(MockEmbedding::with_dimensions(64))
    }

    #[tokio::test]
    async fn test_build_and_retrieve() {
        let dense = DenseRetriever::build(corpus(), embedder(), "mock-model")
            .await
            .unwrap();
        assert_eq!(dense.len(), 3);
        assert_eq!(dense.meta().dim, 64);

        // The exact corpus text is the nearest neighbor of itself.
        let docs = dense.retrieve("정말 감동적인 결말이었다", 1).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].metadata["source"], "yes24");
        assert!((docs[0].score - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_empty_query_and_empty_corpus() {
        let dense = DenseRetriever::build(corpus(), embedder(), "mock-model")
            .await
            .unwrap();
        assert!(dense.retrieve("  ", 3).await.unwrap().is_empty());

        let empty = DenseRetriever::build(vec![], embedder(), "mock-model")
            .await
            .unwrap();
        assert!(empty.is_empty());
        assert!(empty.retrieve("질문", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_k_larger_than_corpus() {
        let dense = DenseRetriever::build(corpus(), embedder(), "mock-model")
            .await
            .unwrap();
        let docs = dense.retrieve("아무 질문", 50).await.unwrap();
        assert_eq!(docs.len(), 3);
    }

    #[tokio::test]
    async fn test_scores_descending() {
        let dense = DenseRetriever::build(corpus(), embedder(), "mock-model")
            .await
            .unwrap();
        let docs = dense.retrieve("결말", 3).await.unwrap();
        for pair in docs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_persist_and_reload_same_topk() {
        let dir = tempfile::tempdir().unwrap();
        let built = DenseRetriever::build(corpus(), embedder(), "mock-model")
            .await
            .unwrap();
        built.persist(dir.path()).unwrap();

        let reloaded =
            DenseRetriever::open_or_build(dir.path(), corpus(), embedder(), "mock-model")
                .await
                .unwrap();

        let fresh = built.retrieve("감동적인 결말", 3).await.unwrap();
        let loaded = reloaded.retrieve("감동적인 결말", 3).await.unwrap();
        assert_eq!(fresh.len(), loaded.len());
        for (a, b) in fresh.iter().zip(loaded.iter()) {
            assert_eq!(a.text, b.text);
            assert!((a.score - b.score).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_open_or_build_rebuilds_on_model_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let built = DenseRetriever::build(corpus(), embedder(), "old-model")
            .await
            .unwrap();
        built.persist(dir.path()).unwrap();

        let reopened =
            DenseRetriever::open_or_build(dir.path(), corpus(), embedder(), "new-model")
                .await
                .unwrap();
        assert_eq!(reopened.meta().model, "new-model");

        // The rebuild was persisted over the stale index.
        let meta_raw = std::fs::read_to_string(dir.path().join(META_FILE)).unwrap();
        let meta: IndexMeta = serde_json::from_str(&meta_raw).unwrap();
        assert_eq!(meta.model, "new-model");
    }

    #[tokio::test]
    async fn test_open_or_build_rebuilds_on_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let built = DenseRetriever::build(corpus(), embedder(), "mock-model")
            .await
            .unwrap();
        built.persist(dir.path()).unwrap();

        let mut grown = corpus();
        grown.push(doc("추가된 새 리뷰", "yes24"));
        let reopened =
            DenseRetriever::open_or_build(dir.path(), grown, embedder(), "mock-model")
                .await
                .unwrap();
        assert_eq!(reopened.len(), 4);
    }

    #[tokio::test]
    async fn test_open_or_build_missing_dir_builds() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = dir.path().join("never-written");
        let dense =
            DenseRetriever::open_or_build(&index_dir, corpus(), embedder(), "mock-model")
                .await
                .unwrap();
        assert_eq!(dense.len(), 3);
        // A fresh index was persisted for the next start.
        assert!(index_dir.join(META_FILE).exists());
        assert!(index_dir.join(INDEX_FILE).exists());
    }

    #[tokio::test]
    async fn test_corrupt_index_file_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        let built = DenseRetriever::build(corpus(), embedder(), "mock-model")
            .await
            .unwrap();
        built.persist(dir.path()).unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), "not json").unwrap();

        let reopened =
            DenseRetriever::open_or_build(dir.path(), corpus(), embedder(), "mock-model")
                .await
                .unwrap();
        assert_eq!(reopened.len(), 3);
        assert!(reopened.retrieve("결말", 1).await.unwrap().len() == 1);
    }
}
