//! Diagnostic request logging, active only in development mode.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::AppState;

/// Logs method, path, status and latency for each request.
pub async fn log_requests(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if !state.mode.is_development() {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::debug!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    response
}
