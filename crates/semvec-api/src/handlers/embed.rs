//! Embedding endpoint handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extract::Json;
use crate::handlers::require_embedder;
use crate::state::AppState;

/// Single text embedding request
#[derive(Deserialize, ToSchema)]
pub struct EmbedRequest {
    /// Text to embed
    #[schema(example = "안녕하세요")]
    pub text: String,
}

/// Single text embedding response
#[derive(Serialize, ToSchema)]
pub struct EmbedResponse {
    pub embedding: Vec<f32>,
    #[schema(example = 1024)]
    pub dimension: usize,
    #[schema(example = "multilingual-e5-large")]
    pub model: String,
}

/// Batch embedding request
#[derive(Deserialize, ToSchema)]
pub struct EmbedBatchRequest {
    pub texts: Vec<String>,
}

/// Batch embedding response
#[derive(Serialize, ToSchema)]
pub struct EmbedBatchResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: usize,
    pub count: usize,
    pub model: String,
}

/// Embed a single text
#[utoipa::path(
    post,
    path = "/embed",
    tag = "embedding",
    request_body = EmbedRequest,
    responses(
        (status = 200, description = "Embedding computed", body = EmbedResponse),
        (status = 422, description = "Empty text", body = crate::error::ApiError),
        (status = 503, description = "No embedding model loaded", body = crate::error::ApiError)
    )
)]
pub async fn embed_text(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmbedRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("Text cannot be empty".to_string()));
    }

    let embedder = require_embedder(&state).await?;
    let embedding = embedder.embed(&request.text).await?;

    let response = EmbedResponse {
        dimension: embedding.len(),
        model: embedder.model_name().to_string(),
        embedding,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Embed a batch of texts in one model invocation
#[utoipa::path(
    post,
    path = "/embed/batch",
    tag = "embedding",
    request_body = EmbedBatchRequest,
    responses(
        (status = 200, description = "Embeddings computed", body = EmbedBatchResponse),
        (status = 422, description = "A text in the batch is empty", body = crate::error::ApiError),
        (status = 503, description = "No embedding model loaded", body = crate::error::ApiError)
    )
)]
pub async fn embed_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmbedBatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    for (index, text) in request.texts.iter().enumerate() {
        if text.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Text at index {index} cannot be empty"
            )));
        }
    }

    let embedder = require_embedder(&state).await?;
    let embeddings = embedder.embed_batch(&request.texts).await?;

    let response = EmbedBatchResponse {
        dimension: embedder.dimension(),
        count: embeddings.len(),
        model: embedder.model_name().to_string(),
        embeddings,
    };

    Ok((StatusCode::OK, Json(response)))
}
