//! Embedding service trait and implementations.
//!
//! - `HttpEmbeddingClient` calls an OpenAI-compatible `/v1/embeddings`
//!   endpoint, batching requests to respect provider limits. This is the
//!   production dense-retrieval backend.
//! - `MockEmbedding` provides deterministic hash-based unit vectors for
//!   testing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use revu_core::config::EmbeddingConfig;
use revu_core::error::{Result, RevuError};

/// Service for generating text embeddings.
///
/// Implementations convert text into fixed-dimensional vectors. Used for
/// both corpus indexing and query encoding.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for a single text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>>> + Send;

    /// Generate embedding vectors for a batch of texts, preserving order.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send;

    /// Return the dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// `EmbeddingService::embed` returns `impl Future`, so the trait is not
/// object-safe. This variant boxes the futures, allowing
/// `Box<dyn DynEmbeddingService>` to be stored without generics. A blanket
/// impl covers every `EmbeddingService`.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>>> + Send + 'a>>;

    fn embed_batch_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>>> + Send + 'a>> {
        Box::pin(self.embed(text))
    }

    fn embed_batch_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>>> + Send + 'a>>
    {
        Box::pin(self.embed_batch(texts))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// HttpEmbeddingClient - remote embedding service
// ---------------------------------------------------------------------------

/// Embedding client for an OpenAI-compatible embeddings API.
pub struct HttpEmbeddingClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    batch_size: usize,
    dimensions: usize,
}

impl HttpEmbeddingClient {
    /// Default dimension reported before the first response arrives.
    const DEFAULT_DIMENSIONS: usize = 1024;

    /// Build a client from configuration, reading the API key from the
    /// configured environment variable. Missing keys fail construction.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| RevuError::Config(format!("{} is not set", config.api_key_env)))?;
        if !api_key.is_ascii() {
            return Err(RevuError::Config(format!(
                "{} contains non-ASCII characters; set a real API key",
                config.api_key_env
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RevuError::Config(format!("HTTP client build failed: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            batch_size: config.batch_size.max(1),
            dimensions: Self::DEFAULT_DIMENSIONS,
        })
    }

    /// The model identifier used for compatibility checks on persisted indexes.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        debug!(count = texts.len(), model = %self.model, "Sending embeddings request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| RevuError::Embedding(format!("embeddings request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RevuError::Embedding(format!(
                "embeddings request returned {}: {}",
                status, detail
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RevuError::Embedding(format!("embeddings decode failed: {}", e)))?;

        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

impl EmbeddingService for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(RevuError::Embedding("cannot embed empty text".to_string()));
        }
        let batch = self.request_batch(std::slice::from_ref(&text.to_string())).await?;
        batch
            .into_iter()
            .next()
            .ok_or_else(|| RevuError::Embedding("embeddings response was empty".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let mut vectors = self.request_batch(chunk).await?;
            if vectors.len() != chunk.len() {
                return Err(RevuError::Embedding(format!(
                    "embeddings response had {} vectors for {} inputs",
                    vectors.len(),
                    chunk.len()
                )));
            }
            out.append(&mut vectors);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service returning deterministic unit vectors.
///
/// The output is derived from a hash of the input text, so identical inputs
/// always produce identical outputs. This allows testing index persistence
/// and ranking without a real model.
#[derive(Debug, Clone)]
pub struct MockEmbedding {
    dimensions: usize,
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self { dimensions: 384 }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        // L2-normalize so inner products behave like cosine similarity.
        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(RevuError::Embedding("cannot embed empty text".to_string()));
        }
        Ok(self.hash_to_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Embedding service that fails every call, for fallback-path tests.
#[derive(Debug, Clone, Default)]
pub struct FailingEmbedding;

impl EmbeddingService for FailingEmbedding {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RevuError::Embedding(
            "embedding service unreachable".to_string(),
        ))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(RevuError::Embedding(
            "embedding service unreachable".to_string(),
        ))
    }

    fn dimensions(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_dimension() {
        let service = MockEmbedding::new();
        let vec = service.embed("안녕하세요").await.unwrap();
        assert_eq!(vec.len(), 384);
    }

    #[tokio::test]
    async fn test_mock_embedding_deterministic() {
        let service = MockEmbedding::new();
        let v1 = service.embed("same text").await.unwrap();
        let v2 = service.embed("same text").await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_mock_embedding_different_inputs() {
        let service = MockEmbedding::new();
        let v1 = service.embed("text one").await.unwrap();
        let v2 = service.embed("text two").await.unwrap();
        assert_ne!(v1, v2);
    }

    #[tokio::test]
    async fn test_mock_embedding_empty_text() {
        let service = MockEmbedding::new();
        assert!(service.embed("").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_embedding_unit_norm() {
        let service = MockEmbedding::new();
        let vec = service.embed("norm check").await.unwrap();
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_mock_embed_batch_preserves_order() {
        let service = MockEmbedding::with_dimensions(16);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let batch = service.embed_batch(&texts).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0], service.embed("a").await.unwrap());
        assert_eq!(batch[2], service.embed("c").await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_embedding() {
        let service = FailingEmbedding;
        assert!(service.embed("anything").await.is_err());
        assert!(service.embed_batch(&["x".to_string()]).await.is_err());
    }

    #[test]
    fn test_http_client_missing_key_is_config_error() {
        let config = EmbeddingConfig {
            api_key_env: "REVU_TEST_EMBED_MISSING".to_string(),
            ..EmbeddingConfig::default()
        };
        std::env::remove_var("REVU_TEST_EMBED_MISSING");
        let result = HttpEmbeddingClient::from_config(&config);
        assert!(matches!(result, Err(RevuError::Config(_))));
    }

    #[test]
    fn test_embedding_response_decode_reorders_by_index() {
        let json = r#"{"data":[
            {"index":1,"embedding":[0.2]},
            {"index":0,"embedding":[0.1]}
        ]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![0.1]);
        assert_eq!(parsed.data[1].embedding, vec![0.2]);
    }
}
