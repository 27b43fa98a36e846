//! API route definitions

use crate::handlers::{collections, embed, health};
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

/// Combined OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Semvec API",
        description = "Embedding and vector search service"
    ),
    paths(
        health::health_check,
        health::readiness_check,
        embed::embed_text,
        embed::embed_batch,
        collections::create_collection,
        collections::list_collections,
        collections::delete_collection,
        collections::insert_records,
        collections::search_collection,
        collections::search_collection_by_vector,
    ),
    components(schemas(
        crate::error::ApiError,
        health::HealthResponse,
        health::ModelHealth,
        health::StoreHealth,
        health::ReadinessResponse,
        health::ReadinessChecks,
        embed::EmbedRequest,
        embed::EmbedResponse,
        embed::EmbedBatchRequest,
        embed::EmbedBatchResponse,
        collections::CreateCollectionRequest,
        collections::CreateCollectionResponse,
        collections::CollectionListResponse,
        collections::DeleteCollectionResponse,
        collections::InsertItem,
        collections::InsertRequest,
        collections::InsertResponse,
        collections::SearchRequest,
        collections::VectorSearchRequest,
        collections::SearchResultItem,
        collections::SearchResponse,
    )),
    tags(
        (name = "health", description = "Service health and readiness"),
        (name = "embedding", description = "Text embedding endpoints"),
        (name = "collections", description = "Collection management and vector search")
    )
)]
pub struct ApiDoc;

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Embedding endpoints
        .route("/embed", post(embed::embed_text))
        .route("/embed/batch", post(embed::embed_batch))
        // Collection endpoints
        .route("/collection/create", post(collections::create_collection))
        .route("/collection/list", get(collections::list_collections))
        .route("/collection/:name", delete(collections::delete_collection))
        .route("/collection/:name/insert", post(collections::insert_records))
        .route("/collection/:name/search", post(collections::search_collection))
        .route(
            "/collection/:name/search/vector",
            post(collections::search_collection_by_vector),
        )
}
