//! Per-client API rate limiting.
//!
//! Requests under the `/api` prefix are counted per client address in a
//! fixed one-hour window; non-API paths are exempt. The limiter owns its
//! window store and clock so it can be driven by a fake clock in tests and
//! swapped for a distributed store without touching the middleware.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::AppError;
use crate::http::AppState;

/// Requests allowed per client per window.
pub const API_RATE_LIMIT: u64 = 100;

/// Window length.
pub const API_RATE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Time source for window accounting.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A controllable clock for tests.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<Instant>>);

impl ManualClock {
    pub fn start() -> Self {
        Self(Arc::new(Mutex::new(Instant::now())))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Per-client window state.
struct ClientWindow {
    started: Instant,
    count: u64,
}

/// Outcome of a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u64 },
    Limited,
}

/// Process-wide request counter keyed by client address.
pub struct RateLimiter {
    max: u64,
    window: Duration,
    clock: Box<dyn Clock>,
    windows: Mutex<HashMap<String, ClientWindow>>,
}

impl RateLimiter {
    /// Limiter on the wall clock.
    pub fn new(max: u64, window: Duration) -> Self {
        Self::with_clock(max, window, SystemClock)
    }

    /// Limiter with an injected time source.
    pub fn with_clock(max: u64, window: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            max,
            window,
            clock: Box::new(clock),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Atomically checks and counts one request for a client.
    ///
    /// The window is fixed: it resets once its full length has elapsed
    /// since the first counted request.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let window = windows.entry(key.to_string()).or_insert(ClientWindow {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max {
            return RateDecision::Limited;
        }
        window.count += 1;
        RateDecision::Allowed {
            remaining: self.max - window.count,
        }
    }

    pub fn max(&self) -> u64 {
        self.max
    }
}

/// Counts API requests per client; everything else passes untouched.
pub async fn limit_api_requests(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if !req.uri().path().starts_with("/api") {
        return next.run(req).await;
    }

    let key = client_key(&req);
    match state.limiter.check(&key) {
        RateDecision::Allowed { remaining } => {
            let limit = state.limiter.max();
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        RateDecision::Limited => AppError::RateLimited.into_response(),
    }
}

/// Resolves the client address: forwarded headers first, then the socket.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
    {
        return real_ip.to_string();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(matches!(
                limiter.check("10.0.0.1"),
                RateDecision::Allowed { .. }
            ));
        }
        assert_eq!(limiter.check("10.0.0.1"), RateDecision::Limited);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(matches!(
            limiter.check("10.0.0.1"),
            RateDecision::Allowed { .. }
        ));
        assert_eq!(limiter.check("10.0.0.1"), RateDecision::Limited);
        assert!(matches!(
            limiter.check("10.0.0.2"),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn test_window_expires() {
        let clock = ManualClock::start();
        let limiter = RateLimiter::with_clock(1, Duration::from_secs(3600), clock.clone());

        assert!(matches!(
            limiter.check("10.0.0.1"),
            RateDecision::Allowed { .. }
        ));
        assert_eq!(limiter.check("10.0.0.1"), RateDecision::Limited);

        clock.advance(Duration::from_secs(3601));
        assert!(matches!(
            limiter.check("10.0.0.1"),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn test_remaining_decreases() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        assert_eq!(
            limiter.check("10.0.0.1"),
            RateDecision::Allowed { remaining: 4 }
        );
        assert_eq!(
            limiter.check("10.0.0.1"),
            RateDecision::Allowed { remaining: 3 }
        );
    }

    #[test]
    fn test_limit_not_reset_mid_window() {
        let clock = ManualClock::start();
        let limiter = RateLimiter::with_clock(1, Duration::from_secs(3600), clock.clone());

        limiter.check("10.0.0.1");
        clock.advance(Duration::from_secs(1800));
        assert_eq!(limiter.check("10.0.0.1"), RateDecision::Limited);
    }
}
