//! Semvec API Server
//!
//! REST API server for embedding generation and vector search.

use semvec_api::{create_router, state::AppState};
use semvec_core::AppConfig;
use semvec_vector::{create_embedder, QdrantStore};
use std::sync::Arc;

/// Load from the SEMVEC_CONFIG file when set, otherwise from env vars
fn load_config() -> anyhow::Result<AppConfig> {
    let config = match std::env::var("SEMVEC_CONFIG") {
        Ok(path) => AppConfig::from_file(path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "semvec_api=debug,tower_http=debug".into()),
        )
        .init();

    // Load configuration
    let config = load_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(config.clone()));

    // Load the embedding model off the async runtime. Model files are
    // downloaded on first use, so this can take a while; a failure
    // leaves the embed endpoints degraded instead of aborting startup.
    let embedding_config = config.embedding.clone();
    match tokio::task::spawn_blocking(move || create_embedder(&embedding_config)).await? {
        Ok(embedder) => {
            tracing::info!(
                "Embedding model loaded: {} (dim={})",
                embedder.model_name(),
                embedder.dimension()
            );
            state.set_embedder(embedder).await;
        }
        Err(e) => {
            tracing::warn!("Embedding model unavailable, embed endpoints degraded: {e}");
        }
    }

    // Connect the vector store; the channel is established lazily on
    // the first call, so this only validates the configured URL.
    match QdrantStore::connect(&config.store) {
        Ok(store) => {
            tracing::info!("Vector store configured: {}", config.store.url);
            state.set_store(Arc::new(store)).await;
        }
        Err(e) => {
            tracing::warn!("Vector store unavailable, collection endpoints degraded: {e}");
        }
    }

    state.set_ready(true);

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Semvec API server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
