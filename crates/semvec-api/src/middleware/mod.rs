//! Request tracking middleware

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Count every request and log its outcome with latency
pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.increment_requests();
    let response = next.run(request).await;

    tracing::debug!(
        "{} {} -> {} ({}us)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_micros()
    );

    response
}
