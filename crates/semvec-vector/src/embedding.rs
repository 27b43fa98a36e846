//! Embedding backends for generating vector representations
//!
//! Supports local ONNX inference via fastembed and OpenAI-compatible
//! embedding APIs.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use reqwest::Client;
use semvec_core::{EmbedderKind, EmbeddingConfig, Result, SemvecError};
use serde::{Deserialize, Serialize};

/// Model used when the config names no local model.
pub const DEFAULT_LOCAL_MODEL: &str = "multilingual-e5-large";

/// Model used when the config names no OpenAI model.
pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

// ============================================================================
// Embedder Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// Generate an embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get embedding dimension
    fn dimension(&self) -> usize;

    /// Name of the underlying model
    fn model_name(&self) -> &str;
}

// ============================================================================
// Local Embedding (fastembed)
// ============================================================================

/// Local embedding backend running ONNX inference in-process.
///
/// The fastembed session is not documented as safe for concurrent use, so
/// all inference runs through a mutex on a blocking thread.
pub struct LocalEmbedding {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl LocalEmbedding {
    /// Load a local model by name.
    ///
    /// Downloads model files into the fastembed cache on first use and
    /// blocks until the session is ready, so call this from a blocking
    /// context at startup.
    pub fn new(model_name: &str) -> Result<Self> {
        let (model, dimension) = resolve_local_model(model_name)?;

        tracing::info!("Loading embedding model: {}", model_name);
        let session =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
                .map_err(|e| {
                    SemvecError::ModelUnavailable(format!("Failed to load {model_name}: {e}"))
                })?;
        tracing::info!("Embedding model ready: {} (dim={})", model_name, dimension);

        Ok(Self {
            model: Arc::new(Mutex::new(session)),
            model_name: model_name.to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl TextEmbedder for LocalEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| SemvecError::ModelUnavailable("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let batch = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let session = model.lock().map_err(|_| {
                SemvecError::ModelUnavailable("Embedding session lock poisoned".to_string())
            })?;
            session
                .embed(batch, None)
                .map_err(|e| SemvecError::ModelUnavailable(format!("Inference failed: {e}")))
        })
        .await
        .map_err(|e| SemvecError::ModelUnavailable(format!("Embedding task failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Map a public model name onto a fastembed model and its dimension
fn resolve_local_model(name: &str) -> Result<(EmbeddingModel, usize)> {
    match name {
        "multilingual-e5-large" => Ok((EmbeddingModel::MultilingualE5Large, 1024)),
        "multilingual-e5-base" => Ok((EmbeddingModel::MultilingualE5Base, 768)),
        "multilingual-e5-small" => Ok((EmbeddingModel::MultilingualE5Small, 384)),
        "bge-large-en-v1.5" => Ok((EmbeddingModel::BGELargeENV15, 1024)),
        "bge-small-en-v1.5" => Ok((EmbeddingModel::BGESmallENV15, 384)),
        "all-minilm-l6-v2" => Ok((EmbeddingModel::AllMiniLML6V2, 384)),
        other => Err(SemvecError::Config(format!(
            "Unknown local embedding model: {other}"
        ))),
    }
}

// ============================================================================
// OpenAI Embedding
// ============================================================================

/// OpenAI-compatible embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedding {
    /// Create a new OpenAI embedding client
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let model = model.into();
        let dimension = match model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536, // Default
        };

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model,
            dimension,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| SemvecError::Config("OpenAI API key required".to_string()))?;
        let model = config.model.as_deref().unwrap_or(DEFAULT_OPENAI_MODEL);

        Ok(Self::new(
            api_key.clone(),
            config.openai_base_url.clone(),
            model,
        ))
    }
}

#[async_trait]
impl TextEmbedder for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| SemvecError::ModelUnavailable("No embedding returned".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OpenAiEmbeddingRequest {
            input: texts.to_vec(),
            model: self.model.clone(),
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                SemvecError::ModelUnavailable(format!("Embedding request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SemvecError::ModelUnavailable(format!(
                "OpenAI embedding error: {error_text}"
            )));
        }

        let result: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            SemvecError::ModelUnavailable(format!("Failed to parse embedding response: {e}"))
        })?;

        // Sort by index and extract embeddings
        let mut embeddings: Vec<_> = result.data.into_iter().collect();
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Deterministic Embedder
// ============================================================================

/// Deterministic embedder for tests and offline development.
///
/// Hashes character unigrams and bigrams into a fixed-dimension vector and
/// L2-normalizes the result, so overlapping texts score higher than
/// unrelated ones without any model weights.
pub struct DeterministicEmbedder {
    dimension: usize,
}

impl DeterministicEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let chars: Vec<char> = text.chars().collect();

        for gram in chars.chunks(1).chain(chars.windows(2)) {
            let mut hasher = DefaultHasher::new();
            gram.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl TextEmbedder for DeterministicEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_one(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "deterministic"
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding backend from config.
///
/// Loading a local model blocks on download and session setup, so call
/// this from a blocking context.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn TextEmbedder>> {
    match config.provider {
        EmbedderKind::Local => {
            let model = config.model.as_deref().unwrap_or(DEFAULT_LOCAL_MODEL);
            Ok(Arc::new(LocalEmbedding::new(model)?))
        }
        EmbedderKind::OpenAi => Ok(Arc::new(OpenAiEmbedding::from_config(config)?)),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine_similarity;
    use proptest::prelude::*;

    #[test]
    fn test_openai_dimension() {
        let client = OpenAiEmbedding::new("test-key", "https://api.openai.com", "text-embedding-3-small");
        assert_eq!(client.dimension(), 1536);

        let client = OpenAiEmbedding::new("test-key", "https://api.openai.com", "text-embedding-3-large");
        assert_eq!(client.dimension(), 3072);
    }

    #[test]
    fn test_openai_from_config_requires_key() {
        let config = EmbeddingConfig {
            provider: EmbedderKind::OpenAi,
            ..Default::default()
        };
        let result = OpenAiEmbedding::from_config(&config);
        assert!(matches!(result, Err(SemvecError::Config(_))));
    }

    #[tokio::test]
    async fn test_openai_empty_batch_skips_network() {
        let client = OpenAiEmbedding::new("test-key", "http://127.0.0.1:9", "text-embedding-3-small");
        let embeddings = client.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[test]
    fn test_local_model_table() {
        let (_, dim) = resolve_local_model("multilingual-e5-large").unwrap();
        assert_eq!(dim, 1024);

        let (_, dim) = resolve_local_model("bge-small-en-v1.5").unwrap();
        assert_eq!(dim, 384);

        let (_, dim) = resolve_local_model("all-minilm-l6-v2").unwrap();
        assert_eq!(dim, 384);
    }

    #[test]
    fn test_unknown_local_model_rejected() {
        let result = resolve_local_model("definitely-not-a-model");
        assert!(matches!(result, Err(SemvecError::Config(_))));
    }

    #[tokio::test]
    async fn test_deterministic_embedder_is_deterministic() {
        let embedder = DeterministicEmbedder::new(64);
        let a = embedder.embed("안녕하세요").await.unwrap();
        let b = embedder.embed("안녕하세요").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_identical_text_scores_one() {
        let embedder = DeterministicEmbedder::new(128);
        let a = embedder.embed("vector databases are useful").await.unwrap();
        let b = embedder.embed("vector databases are useful").await.unwrap();
        assert!(cosine_similarity(&a, &b) > 0.999);
    }

    #[tokio::test]
    async fn test_shared_ngrams_score_higher() {
        let embedder = DeterministicEmbedder::new(1024);
        let query = embedder.embed("안녕하세요").await.unwrap();
        let related = embedder.embed("안녕").await.unwrap();
        let unrelated = embedder.embed("weather report for tomorrow").await.unwrap();
        assert!(
            cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated)
        );
    }

    proptest! {
        #[test]
        fn prop_batch_matches_single(texts in proptest::collection::vec(".*", 0..8)) {
            let embedder = DeterministicEmbedder::new(64);
            let batch = tokio_test::block_on(embedder.embed_batch(&texts)).unwrap();
            prop_assert_eq!(batch.len(), texts.len());
            for (text, vector) in texts.iter().zip(&batch) {
                let single = tokio_test::block_on(embedder.embed(text)).unwrap();
                prop_assert_eq!(&single, vector);
            }
        }

        #[test]
        fn prop_embeddings_are_unit_or_zero(text in ".*") {
            let embedder = DeterministicEmbedder::new(64);
            let vector = tokio_test::block_on(embedder.embed(&text)).unwrap();
            let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            prop_assert!(norm < 1.0001);
            prop_assert!(norm == 0.0 || norm > 0.9999);
        }
    }
}
