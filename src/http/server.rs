//! HTTP server: router assembly and listener.
//!
//! The router is built once with the middleware pipeline in its fixed
//! order; see `middleware` for the stage list. Static mounts are added
//! outside the pipeline so matching requests short-circuit every later
//! stage.

use std::any::Any;
use std::net::SocketAddr;

use axum::extract::{DefaultBodyLimit, OriginalUri};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::{
    limit_api_requests, log_requests, parse_cookies, set_security_headers, stamp_request_time,
};

use super::extract::MAX_BODY_BYTES;
use super::review_routes::review_routes;
use super::tour_routes::tour_routes;
use super::user_routes::user_routes;
use super::view_routes::view_routes;
use super::AppState;

/// The application HTTP server.
pub struct HttpServer {
    config: AppConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: AppConfig, state: AppState) -> Self {
        let router = Self::router(state);
        Self { config, router }
    }

    /// Builds the full router: views, versioned API groups, the not-found
    /// fallback, the middleware pipeline, and the static mounts.
    pub fn router(state: AppState) -> Router {
        let pipeline = ServiceBuilder::new()
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(from_fn(set_security_headers))
            .layer(from_fn_with_state(state.clone(), log_requests))
            .layer(from_fn_with_state(state.clone(), limit_api_requests))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(from_fn(parse_cookies))
            .layer(from_fn(stamp_request_time));

        Router::new()
            .merge(view_routes())
            .nest("/api/v1/tours", tour_routes())
            .nest("/api/v1/users", user_routes())
            .nest("/api/v1/reviews", review_routes())
            .fallback(unmatched_path)
            .layer(pipeline)
            .nest_service("/css", ServeDir::new("public/css"))
            .nest_service("/img", ServeDir::new("public/img"))
            .with_state(state)
    }

    /// The socket address string the server will bind.
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Binds the listener and serves until a shutdown signal, draining
    /// in-flight requests before returning.
    pub async fn start(self) -> std::io::Result<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, mode = ?self.config.mode, "listening");

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

/// Any unmatched path, under any method, fails with the requested path
/// carried verbatim in the message.
async fn unmatched_path(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound {
        path: uri.to_string(),
    }
}

/// Converts an in-request panic into the generic server-fault path.
///
/// Faults outside any request's scope are not handled here; those reach
/// the process-level hook in bootstrap and terminate.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "opaque panic payload".to_string()
    };
    tracing::error!(%detail, "request handler panicked");
    AppError::Internal(format!("request handler panicked: {detail}")).into_response()
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}
