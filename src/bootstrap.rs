//! Process bootstrap.
//!
//! Loads configuration, initializes logging, installs the process-level
//! fatal handler, acquires the store handle and starts the listener. Any
//! error here propagates to `main`, which exits non-zero.

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, ConfigError, RunMode};
use crate::error;
use crate::http::{AppState, HttpServer};
use crate::middleware::rate_limit::{API_RATE_LIMIT, API_RATE_WINDOW};
use crate::middleware::RateLimiter;
use crate::store::{DocumentStore, MemoryStore};

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the application to completion.
pub async fn run() -> Result<(), BootstrapError> {
    let config = AppConfig::from_env()?;

    init_tracing(config.mode);
    error::install_exposure(config.mode);
    install_panic_hook();

    let store = connect_store(&config);
    let limiter = Arc::new(RateLimiter::new(API_RATE_LIMIT, API_RATE_WINDOW));
    let state = AppState::new(config.mode, store, limiter);

    HttpServer::new(config, state).start().await?;
    Ok(())
}

fn init_tracing(mode: RunMode) {
    let default_filter = match mode {
        RunMode::Development => "tourbase=debug,tower_http=debug",
        RunMode::Production => "tourbase=info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Logs unrecovered faults outside any request's scope before the process
/// dies. In-request panics never reach this; the panic supervisor in the
/// pipeline converts them to server-fault responses.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(%info, "fatal: unrecovered panic, shutting down");
        previous(info);
    }));
}

/// Acquires the single long-lived store handle.
///
/// The in-memory store stands in for the document database here; a driver
/// deployment would dial `config.connection_string()` instead. The URL is
/// logged in placeholder form so the substituted password never appears.
fn connect_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    tracing::info!(url = %config.database_url, "database connection established");
    Arc::new(MemoryStore::new())
}
