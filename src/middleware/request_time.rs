//! Request-time stamping.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};

/// Capture timestamp attached to every request for downstream use; list
/// responses surface it as `requestedAt`.
#[derive(Debug, Clone, Copy)]
pub struct RequestTime(pub DateTime<Utc>);

/// Attaches the capture timestamp to the request context.
pub async fn stamp_request_time(mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(RequestTime(Utc::now()));
    next.run(req).await
}
