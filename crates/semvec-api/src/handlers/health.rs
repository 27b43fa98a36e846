//! Health check handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when all backends are usable, "degraded" otherwise
    #[schema(example = "ok")]
    pub status: String,
    pub version: String,
    pub model: ModelHealth,
    pub store: StoreHealth,
}

/// Embedding backend portion of the health report
#[derive(Serialize, ToSchema)]
pub struct ModelHealth {
    pub ready: bool,
    /// Name of the loaded embedding model
    #[schema(example = "multilingual-e5-large")]
    pub model: Option<String>,
    pub dimension: Option<usize>,
}

/// Vector store portion of the health report
#[derive(Serialize, ToSchema)]
pub struct StoreHealth {
    pub connected: bool,
    /// Number of collections, when the store answered the probe
    pub collections: Option<usize>,
}

/// Liveness probe.
///
/// Always answers 200; a missing model or unreachable store is reported
/// as "degraded" in the body instead of failing the probe.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let embedder = state.get_embedder().await;
    let store = state.get_store().await;

    let model = ModelHealth {
        ready: embedder.is_some(),
        model: embedder.as_ref().map(|e| e.model_name().to_string()),
        dimension: embedder.as_ref().map(|e| e.dimension()),
    };

    let collections = match &store {
        Some(store) => store.collection_count().await.ok(),
        None => None,
    };
    let store = StoreHealth {
        connected: collections.is_some(),
        collections,
    };

    let status = if model.ready && store.connected {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model,
        store,
    })
}

/// Readiness response
#[derive(Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessChecks {
    pub model: bool,
    pub store: bool,
}

/// Readiness probe - 503 until startup initialization has finished
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready"),
        (status = 503, description = "Service not ready")
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let is_ready = state.is_ready();

    let checks = ReadinessChecks {
        model: state.get_embedder().await.is_some(),
        store: state.get_store().await.is_some(),
    };

    let response = ReadinessResponse {
        ready: is_ready,
        checks,
    };

    if is_ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// JSON metrics response
#[derive(Serialize)]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub requests_per_second: f64,
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.uptime_secs();
    let total_requests = state.get_request_count();
    let rps = if uptime > 0 {
        total_requests as f64 / uptime as f64
    } else {
        0.0
    };

    Json(MetricsResponse {
        uptime_seconds: uptime,
        total_requests,
        requests_per_second: rps,
    })
}
