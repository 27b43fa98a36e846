//! API handlers

pub mod collections;
pub mod embed;
pub mod health;

use std::sync::Arc;

use semvec_vector::{TextEmbedder, VectorStore};

use crate::error::AppError;
use crate::state::AppState;

/// Fetch the embedding backend or fail with 503
pub(crate) async fn require_embedder(state: &AppState) -> Result<Arc<dyn TextEmbedder>, AppError> {
    state
        .get_embedder()
        .await
        .ok_or_else(|| AppError::ModelUnavailable("No embedding model is loaded".to_string()))
}

/// Fetch the vector store backend or fail with 502
pub(crate) async fn require_store(state: &AppState) -> Result<Arc<dyn VectorStore>, AppError> {
    state
        .get_store()
        .await
        .ok_or_else(|| AppError::Upstream("No vector store is configured".to_string()))
}
