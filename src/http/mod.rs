//! HTTP surface: router dispatch, extraction, envelopes and the server.

use std::sync::Arc;

use crate::config::RunMode;
use crate::middleware::RateLimiter;
use crate::store::DocumentStore;

pub mod extract;
pub mod response;
pub mod review_routes;
pub mod sanitize;
pub mod server;
pub mod tour_routes;
pub mod user_routes;
pub mod view_routes;

pub use server::HttpServer;

/// State shared by every handler and stateful middleware stage.
#[derive(Clone)]
pub struct AppState {
    pub mode: RunMode,
    /// The storage boundary, acquired once at bootstrap.
    pub store: Arc<dyn DocumentStore>,
    /// Process-wide API rate limiter.
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(mode: RunMode, store: Arc<dyn DocumentStore>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            mode,
            store,
            limiter,
        }
    }
}
