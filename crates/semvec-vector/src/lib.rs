//! Semvec Vector - Embedding backends and vector store abstraction
//!
//! Provides embedding generation (local ONNX inference, OpenAI-compatible
//! APIs) and an abstraction over vector databases (Qdrant) for storing and
//! searching embedded records.

use async_trait::async_trait;
use semvec_core::{InsertOutcome, NewRecord, Result, SearchHit};

pub mod embedding;
pub mod memory;
pub mod qdrant_store;

pub use embedding::{
    create_embedder, DeterministicEmbedder, LocalEmbedding, OpenAiEmbedding, TextEmbedder,
    DEFAULT_LOCAL_MODEL, DEFAULT_OPENAI_MODEL,
};
pub use memory::InMemoryStore;
pub use qdrant_store::QdrantStore;

/// Trait for vector database operations
///
/// Implementations map failures onto the shared taxonomy: a missing
/// collection is `CollectionNotFound`, a vector of the wrong width is
/// `DimensionMismatch`, and transport failures are `Upstream`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Provision a collection with a fixed vector dimension
    async fn create_collection(&self, name: &str, dimension: usize) -> Result<()>;

    /// List collection names
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Drop a collection and all records in it
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Vector dimension the collection was provisioned with
    async fn collection_dimension(&self, name: &str) -> Result<usize>;

    /// Insert records, returning the generated point ids in input order
    async fn insert(&self, collection: &str, records: Vec<NewRecord>) -> Result<InsertOutcome>;

    /// Search a collection for the nearest vectors, best match first
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
        filter: Option<&serde_json::Value>,
    ) -> Result<Vec<SearchHit>>;

    /// Number of collections currently provisioned
    async fn collection_count(&self) -> Result<usize> {
        Ok(self.list_collections().await?.len())
    }
}

/// Cosine similarity between two vectors of equal length.
///
/// Returns 0.0 for mismatched lengths or zero-norm vectors rather than
/// dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_identical_vectors() {
        let v = vec![0.3, 0.5, 0.2];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_vectors() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
