//! Semvec Core - Domain models, errors, and shared types
//!
//! This crate defines the core abstractions used throughout the semvec system:
//! - Common error taxonomy for the embedding and vector-store layers
//! - Record and search-hit models exchanged with the vector store
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, EmbedderKind, EmbeddingConfig, ServerConfig, StoreConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for semvec operations
#[derive(Error, Debug)]
pub enum SemvecError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Vector store unavailable: {0}")]
    Upstream(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SemvecError>;

// ============================================================================
// Record Models
// ============================================================================

/// A record to be written into a collection
///
/// The vector is mandatory and must match the collection's dimension;
/// everything else is payload carried verbatim through store and search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
    /// Embedding vector (model-produced or caller-supplied)
    pub vector: Vec<f32>,

    /// Original source text, kept for traceability
    pub text: Option<String>,

    /// Optional category tag
    pub category: Option<String>,

    /// Open-ended metadata object, preserved as-is
    pub metadata: Option<serde_json::Value>,
}

impl NewRecord {
    /// Create a record carrying only a vector
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            text: None,
            category: None,
            metadata: None,
        }
    }

    /// Attach the source text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach a category tag
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attach a metadata object
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Receipt for a completed insert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOutcome {
    /// Number of records written
    pub count: usize,

    /// Generated point ids, in input order
    pub ids: Vec<String>,
}

// ============================================================================
// Search Models
// ============================================================================

/// One ranked search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Point id of the stored record
    pub id: String,

    /// Cosine similarity reported by the store (higher is more similar)
    pub score: f32,

    /// Stored source text, if any
    pub text: Option<String>,

    /// Stored category tag, if any
    pub category: Option<String>,

    /// Stored metadata object, if any
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_message() {
        let err = SemvecError::DimensionMismatch {
            expected: 1024,
            actual: 768,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 1024, got 768");
    }

    #[test]
    fn test_new_record_builder() {
        let record = NewRecord::new(vec![0.1, 0.2, 0.3])
            .with_text("안녕하세요")
            .with_category("greeting")
            .with_metadata(serde_json::json!({"lang": "ko"}));

        assert_eq!(record.vector.len(), 3);
        assert_eq!(record.text.as_deref(), Some("안녕하세요"));
        assert_eq!(record.category.as_deref(), Some("greeting"));
        assert_eq!(record.metadata, Some(serde_json::json!({"lang": "ko"})));
    }

    #[test]
    fn test_metadata_preserved_verbatim() {
        let metadata = serde_json::json!({
            "source": "kb",
            "page": 12,
            "tags": ["hr", "휴가"],
            "nested": {"score": 0.5}
        });

        let record = NewRecord::new(vec![0.0; 4]).with_metadata(metadata.clone());
        let roundtrip: NewRecord =
            serde_json::from_str(&serde_json::to_string(&record).unwrap()).unwrap();

        assert_eq!(roundtrip.metadata, Some(metadata));
    }

    #[test]
    fn test_validation_error_display() {
        let err = SemvecError::Validation("text must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation error: text must not be empty");
    }
}
