//! Semvec API - embedding and vector search HTTP server
//!
//! Exposes embedding generation and Qdrant-backed collection
//! management over REST, with OpenAPI documentation at /swagger-ui.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use semvec_core::AppConfig;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

/// Build the CORS layer from configured origins; an empty list means
/// any origin is accepted.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.server.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Assemble the full application router around shared state
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics))
        .merge(routes::api_routes())
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", routes::ApiDoc::openapi()),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Router wired to an in-memory store and a deterministic embedder,
/// for integration tests that must not touch the network.
#[cfg(feature = "test-utils")]
pub fn create_router_for_testing() -> Router {
    use semvec_vector::{DeterministicEmbedder, InMemoryStore, TextEmbedder, VectorStore};

    let embedder: Arc<dyn TextEmbedder> = Arc::new(DeterministicEmbedder::new(4));
    let store: Arc<dyn VectorStore> = Arc::new(InMemoryStore::new());

    let state = Arc::new(AppState::with_backends(
        AppConfig::default(),
        Some(embedder),
        Some(store),
    ));

    create_router(state)
}
