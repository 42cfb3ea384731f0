//! Document retrieval for Revu — embedding service, lexical TF-IDF and
//! dense vector retrievers, and construction-time backend selection with
//! lexical fallback.

pub mod corpus;
pub mod dense;
pub mod embedding;
pub mod lexical;
pub mod retriever;

pub use corpus::{load_jsonl, CorpusDocument};
pub use dense::{DenseRetriever, IndexMeta};
pub use embedding::{
    DynEmbeddingService, EmbeddingService, FailingEmbedding, HttpEmbeddingClient, MockEmbedding,
};
pub use lexical::LexicalRetriever;
pub use retriever::{build_retriever, DenseBackend, DocumentRetriever};
