//! Collection management, insert, and search handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use semvec_core::{NewRecord, SearchHit};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::extract::Json;
use crate::handlers::{require_embedder, require_store};
use crate::state::AppState;

/// Fallback vector size when no embedding model is loaded
const DEFAULT_DIMENSION: usize = 1024;

/// Collection names end up in URLs and store identifiers, so only a
/// conservative charset is accepted.
fn validate_collection_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(
            "Collection name cannot be empty".to_string(),
        ));
    }
    if name.len() > 255 {
        return Err(AppError::Validation(
            "Collection name cannot exceed 255 characters".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::Validation(format!(
            "Collection name '{name}' may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}

// ============================================================================
// Create / List / Delete
// ============================================================================

/// Collection creation request
#[derive(Deserialize, ToSchema)]
pub struct CreateCollectionRequest {
    /// Collection name
    #[schema(example = "documents")]
    pub name: String,
    /// Vector dimension; defaults to the loaded model's dimension
    #[schema(example = 1024)]
    pub dimension: Option<usize>,
}

#[derive(Serialize, ToSchema)]
pub struct CreateCollectionResponse {
    pub created: bool,
    pub name: String,
    pub dimension: usize,
}

/// Create a collection
#[utoipa::path(
    post,
    path = "/collection/create",
    tag = "collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created", body = CreateCollectionResponse),
        (status = 409, description = "Collection already exists", body = crate::error::ApiError),
        (status = 422, description = "Invalid name or dimension", body = crate::error::ApiError),
        (status = 502, description = "Vector store unavailable", body = crate::error::ApiError)
    )
)]
pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateCollectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_collection_name(&request.name)?;

    if request.dimension == Some(0) {
        return Err(AppError::Validation(
            "Dimension must be greater than zero".to_string(),
        ));
    }

    let dimension = match request.dimension {
        Some(dimension) => dimension,
        None => match state.get_embedder().await {
            Some(embedder) => embedder.dimension(),
            None => DEFAULT_DIMENSION,
        },
    };

    let store = require_store(&state).await?;
    store.create_collection(&request.name, dimension).await?;

    tracing::info!("Collection '{}' created (dim={})", request.name, dimension);

    let response = CreateCollectionResponse {
        created: true,
        name: request.name,
        dimension,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Serialize, ToSchema)]
pub struct CollectionListResponse {
    pub collections: Vec<String>,
    pub count: usize,
}

/// List collections
#[utoipa::path(
    get,
    path = "/collection/list",
    tag = "collections",
    responses(
        (status = 200, description = "Collection names", body = CollectionListResponse),
        (status = 502, description = "Vector store unavailable", body = crate::error::ApiError)
    )
)]
pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let store = require_store(&state).await?;
    let collections = store.list_collections().await?;

    let response = CollectionListResponse {
        count: collections.len(),
        collections,
    };

    Ok((StatusCode::OK, Json(response)))
}

#[derive(Serialize, ToSchema)]
pub struct DeleteCollectionResponse {
    pub deleted: bool,
    pub name: String,
}

/// Delete a collection
#[utoipa::path(
    delete,
    path = "/collection/{name}",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 200, description = "Collection deleted", body = DeleteCollectionResponse),
        (status = 404, description = "Collection not found", body = crate::error::ApiError),
        (status = 502, description = "Vector store unavailable", body = crate::error::ApiError)
    )
)]
pub async fn delete_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = require_store(&state).await?;
    store.delete_collection(&name).await?;

    tracing::info!("Collection '{}' deleted", name);

    let response = DeleteCollectionResponse {
        deleted: true,
        name,
    };

    Ok((StatusCode::OK, Json(response)))
}

// ============================================================================
// Insert
// ============================================================================

/// One record to insert.
///
/// Items carry either a precomputed `embedding` or a `text` to embed
/// server-side; which one is required depends on the request's
/// `auto_embed` flag. Variant order matters: an item with both keys
/// deserializes as `WithEmbedding` and is rejected under `auto_embed`.
#[derive(Deserialize, ToSchema)]
#[serde(untagged)]
pub enum InsertItem {
    WithEmbedding {
        embedding: Vec<f32>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        metadata: Option<serde_json::Value>,
    },
    WithText {
        text: String,
        #[serde(default)]
        category: Option<String>,
        #[serde(default)]
        metadata: Option<serde_json::Value>,
    },
}

fn default_auto_embed() -> bool {
    true
}

/// Insert request
#[derive(Deserialize, ToSchema)]
pub struct InsertRequest {
    pub items: Vec<InsertItem>,
    /// Embed item texts server-side; false means items carry vectors
    #[serde(default = "default_auto_embed")]
    #[schema(default = true)]
    pub auto_embed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct InsertResponse {
    pub inserted_count: usize,
    pub ids: Vec<String>,
}

/// Insert records into a collection
#[utoipa::path(
    post,
    path = "/collection/{name}/insert",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    request_body = InsertRequest,
    responses(
        (status = 200, description = "Records inserted", body = InsertResponse),
        (status = 400, description = "Vector dimension does not match the collection", body = crate::error::ApiError),
        (status = 404, description = "Collection not found", body = crate::error::ApiError),
        (status = 422, description = "Invalid items", body = crate::error::ApiError),
        (status = 503, description = "auto_embed requested but no model loaded", body = crate::error::ApiError)
    )
)]
pub async fn insert_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<InsertRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.items.is_empty() {
        return Err(AppError::Validation("Items cannot be empty".to_string()));
    }

    let records = if request.auto_embed {
        build_records_from_texts(&state, request.items).await?
    } else {
        build_records_from_embeddings(request.items)?
    };

    let store = require_store(&state).await?;
    let outcome = store.insert(&name, records).await?;

    tracing::debug!("Inserted {} records into '{}'", outcome.count, name);

    let response = InsertResponse {
        inserted_count: outcome.count,
        ids: outcome.ids,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Embed item texts in one batch and pair each vector with its item.
async fn build_records_from_texts(
    state: &AppState,
    items: Vec<InsertItem>,
) -> Result<Vec<NewRecord>, AppError> {
    let mut texts = Vec::with_capacity(items.len());
    let mut fields = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match item {
            InsertItem::WithEmbedding { .. } => {
                return Err(AppError::Validation(format!(
                    "Item {index}: embedding is not allowed when auto_embed is true"
                )));
            }
            InsertItem::WithText {
                text,
                category,
                metadata,
            } => {
                if text.trim().is_empty() {
                    return Err(AppError::Validation(format!(
                        "Item {index}: text cannot be empty"
                    )));
                }
                texts.push(text.clone());
                fields.push((text, category, metadata));
            }
        }
    }

    let embedder = require_embedder(state).await?;
    let vectors = embedder.embed_batch(&texts).await?;

    let records = vectors
        .into_iter()
        .zip(fields)
        .map(|(vector, (text, category, metadata))| {
            let mut record = NewRecord::new(vector).with_text(text);
            if let Some(category) = category {
                record = record.with_category(category);
            }
            if let Some(metadata) = metadata {
                record = record.with_metadata(metadata);
            }
            record
        })
        .collect();

    Ok(records)
}

fn build_records_from_embeddings(items: Vec<InsertItem>) -> Result<Vec<NewRecord>, AppError> {
    let mut records = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        match item {
            InsertItem::WithText { .. } => {
                return Err(AppError::Validation(format!(
                    "Item {index}: embedding is required when auto_embed is false"
                )));
            }
            InsertItem::WithEmbedding {
                embedding,
                text,
                category,
                metadata,
            } => {
                if embedding.is_empty() {
                    return Err(AppError::Validation(format!(
                        "Item {index}: embedding cannot be empty"
                    )));
                }
                let mut record = NewRecord::new(embedding);
                if let Some(text) = text {
                    record = record.with_text(text);
                }
                if let Some(category) = category {
                    record = record.with_category(category);
                }
                if let Some(metadata) = metadata {
                    record = record.with_metadata(metadata);
                }
                records.push(record);
            }
        }
    }

    Ok(records)
}

// ============================================================================
// Search
// ============================================================================

fn default_limit() -> usize {
    5
}

/// Text search request
#[derive(Deserialize, ToSchema)]
pub struct SearchRequest {
    /// Query text, embedded server-side
    #[schema(example = "안녕하세요")]
    pub query: String,
    /// Maximum number of hits
    #[serde(default = "default_limit")]
    #[schema(example = 5)]
    pub limit: usize,
    /// Exact-match payload filter, e.g. {"category": "greeting"}
    pub filter: Option<serde_json::Value>,
    /// Payload fields to include in hits; id and score always appear
    pub output_fields: Option<Vec<String>>,
}

/// Raw vector search request
#[derive(Deserialize, ToSchema)]
pub struct VectorSearchRequest {
    pub vector: Vec<f32>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub filter: Option<serde_json::Value>,
    pub output_fields: Option<Vec<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResultItem {
    pub id: String,
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Serialize, ToSchema)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
    pub count: usize,
}

/// Search a collection by query text
#[utoipa::path(
    post,
    path = "/collection/{name}/search",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Ranked hits", body = SearchResponse),
        (status = 404, description = "Collection not found", body = crate::error::ApiError),
        (status = 422, description = "Invalid query or limit", body = crate::error::ApiError),
        (status = 503, description = "No embedding model loaded", body = crate::error::ApiError)
    )
)]
pub async fn search_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<SearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.query.trim().is_empty() {
        return Err(AppError::Validation("Query cannot be empty".to_string()));
    }
    if request.limit == 0 {
        return Err(AppError::Validation(
            "Limit must be greater than zero".to_string(),
        ));
    }

    let embedder = require_embedder(&state).await?;
    let store = require_store(&state).await?;

    let vector = embedder.embed(&request.query).await?;
    let hits = store
        .search(&name, &vector, request.limit, request.filter.as_ref())
        .await?;

    let results = project_hits(hits, request.output_fields.as_deref());

    let response = SearchResponse {
        count: results.len(),
        results,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Search a collection by raw vector
#[utoipa::path(
    post,
    path = "/collection/{name}/search/vector",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    request_body = VectorSearchRequest,
    responses(
        (status = 200, description = "Ranked hits", body = SearchResponse),
        (status = 400, description = "Vector dimension does not match the collection", body = crate::error::ApiError),
        (status = 404, description = "Collection not found", body = crate::error::ApiError),
        (status = 422, description = "Invalid vector or limit", body = crate::error::ApiError)
    )
)]
pub async fn search_collection_by_vector(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<VectorSearchRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.vector.is_empty() {
        return Err(AppError::Validation("Vector cannot be empty".to_string()));
    }
    if request.limit == 0 {
        return Err(AppError::Validation(
            "Limit must be greater than zero".to_string(),
        ));
    }

    let store = require_store(&state).await?;
    let hits = store
        .search(&name, &request.vector, request.limit, request.filter.as_ref())
        .await?;

    let results = project_hits(hits, request.output_fields.as_deref());

    let response = SearchResponse {
        count: results.len(),
        results,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Drop payload fields the caller did not ask for. Id and score are
/// always kept; unknown field names are ignored.
fn project_hits(hits: Vec<SearchHit>, output_fields: Option<&[String]>) -> Vec<SearchResultItem> {
    let keep = |field: &str| match output_fields {
        Some(fields) => fields.iter().any(|f| f == field),
        None => true,
    };

    hits.into_iter()
        .map(|hit| SearchResultItem {
            id: hit.id,
            score: hit.score,
            text: if keep("text") { hit.text } else { None },
            category: if keep("category") { hit.category } else { None },
            metadata: if keep("metadata") { hit.metadata } else { None },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_name_validation() {
        assert!(validate_collection_name("documents").is_ok());
        assert!(validate_collection_name("my-collection_2").is_ok());

        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("   ").is_err());
        assert!(validate_collection_name("has space").is_err());
        assert!(validate_collection_name("slash/name").is_err());
        assert!(validate_collection_name(&"x".repeat(256)).is_err());
        assert!(validate_collection_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_insert_item_with_both_keys_parses_as_embedding() {
        let item: InsertItem = serde_json::from_value(json!({
            "embedding": [0.1, 0.2],
            "text": "hello"
        }))
        .unwrap();

        assert!(matches!(item, InsertItem::WithEmbedding { .. }));
    }

    #[test]
    fn test_insert_item_text_only() {
        let item: InsertItem = serde_json::from_value(json!({
            "text": "안녕하세요",
            "category": "greeting"
        }))
        .unwrap();

        match item {
            InsertItem::WithText { text, category, .. } => {
                assert_eq!(text, "안녕하세요");
                assert_eq!(category.as_deref(), Some("greeting"));
            }
            InsertItem::WithEmbedding { .. } => panic!("parsed as embedding variant"),
        }
    }

    #[test]
    fn test_insert_item_without_text_or_embedding_is_rejected() {
        let result: Result<InsertItem, _> =
            serde_json::from_value(json!({ "category": "greeting" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_insert_request_auto_embed_defaults_to_true() {
        let request: InsertRequest = serde_json::from_value(json!({
            "items": [{"text": "안녕하세요"}]
        }))
        .unwrap();
        assert!(request.auto_embed);

        let request: InsertRequest = serde_json::from_value(json!({
            "items": [{"embedding": [0.1]}],
            "auto_embed": false
        }))
        .unwrap();
        assert!(!request.auto_embed);
    }

    #[test]
    fn test_project_hits_keeps_id_and_score() {
        let hits = vec![SearchHit {
            id: "a".to_string(),
            score: 0.9,
            text: Some("hello".to_string()),
            category: Some("greeting".to_string()),
            metadata: Some(json!({"lang": "en"})),
        }];

        let projected = project_hits(hits, Some(&["text".to_string()]));
        assert_eq!(projected.len(), 1);
        assert_eq!(projected[0].id, "a");
        assert_eq!(projected[0].text.as_deref(), Some("hello"));
        assert!(projected[0].category.is_none());
        assert!(projected[0].metadata.is_none());
    }

    #[test]
    fn test_project_hits_without_fields_keeps_everything() {
        let hits = vec![SearchHit {
            id: "a".to_string(),
            score: 0.9,
            text: Some("hello".to_string()),
            category: None,
            metadata: Some(json!({"lang": "en"})),
        }];

        let projected = project_hits(hits, None);
        assert_eq!(projected[0].text.as_deref(), Some("hello"));
        assert!(projected[0].metadata.is_some());
    }

    #[test]
    fn test_project_hits_ignores_unknown_fields() {
        let hits = vec![SearchHit {
            id: "a".to_string(),
            score: 0.9,
            text: Some("hello".to_string()),
            category: None,
            metadata: None,
        }];

        let projected = project_hits(hits, Some(&["nonexistent".to_string()]));
        assert!(projected[0].text.is_none());
        assert_eq!(projected[0].id, "a");
    }

    #[test]
    fn test_records_from_embeddings_rejects_text_items() {
        let items = vec![InsertItem::WithText {
            text: "hello".to_string(),
            category: None,
            metadata: None,
        }];

        let err = build_records_from_embeddings(items).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_records_from_embeddings_builds_in_order() {
        let items = vec![
            InsertItem::WithEmbedding {
                embedding: vec![1.0, 0.0],
                text: Some("first".to_string()),
                category: None,
                metadata: None,
            },
            InsertItem::WithEmbedding {
                embedding: vec![0.0, 1.0],
                text: None,
                category: Some("second".to_string()),
                metadata: Some(json!({"k": 1})),
            },
        ];

        let records = build_records_from_embeddings(items).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].vector, vec![1.0, 0.0]);
        assert_eq!(records[0].text.as_deref(), Some("first"));
        assert_eq!(records[1].category.as_deref(), Some("second"));
        assert_eq!(records[1].metadata, Some(json!({"k": 1})));
    }
}
