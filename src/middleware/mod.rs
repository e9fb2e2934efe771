//! Request middleware stages.
//!
//! The pipeline order is fixed and assembled once in
//! `http::server::HttpServer::router`; later stages assume earlier ones
//! already normalized the request:
//!
//! 1. panic supervision (outermost)
//! 2. static-asset short-circuit
//! 3. security headers
//! 4. diagnostic request logging (development only)
//! 5. rate limiting for `/api` paths
//! 6. body size cap
//! 7. cookie parsing
//! 8. request-time stamping
//!
//! Parsing, sanitization and the parameter-pollution guard run at payload
//! extraction (`http::extract`), strictly before handler logic.

pub mod cookies;
pub mod rate_limit;
pub mod request_log;
pub mod request_time;
pub mod security;

pub use cookies::{parse_cookies, Cookies};
pub use rate_limit::{limit_api_requests, ManualClock, RateLimiter, SystemClock};
pub use request_log::log_requests;
pub use request_time::{stamp_request_time, RequestTime};
pub use security::set_security_headers;
