//! Error translation layer.
//!
//! Every failure flowing out of middleware, handlers or the store converts
//! here into the uniform client shape. Handlers never format failure
//! responses themselves; they return [`AppError`] and let this module decide
//! exposure, which branches on the installed run mode: development responses
//! carry full diagnostic detail, production responses mask anything
//! non-operational.

use std::backtrace::Backtrace;
use std::sync::OnceLock;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::config::RunMode;
use crate::http::extract::MAX_BODY_BYTES;
use crate::model::FieldError;
use crate::store::StoreError;

/// Result type for request handlers.
pub type AppResult<T> = Result<T, AppError>;

static EXPOSURE: OnceLock<RunMode> = OnceLock::new();

/// Installs the run mode used when rendering error responses.
///
/// Called once from bootstrap; until then (and in test binaries that never
/// call it) responses use production masking.
pub fn install_exposure(mode: RunMode) {
    let _ = EXPOSURE.set(mode);
}

fn exposure() -> RunMode {
    EXPOSURE.get().copied().unwrap_or(RunMode::Production)
}

/// Application failures, classified by status and operational flag.
#[derive(Debug, Error)]
pub enum AppError {
    /// No route matched; carries the requested path verbatim.
    #[error("Unable to find {path} on this server.")]
    NotFound { path: String },

    /// A referenced document does not exist.
    #[error("No {resource} found with that ID.")]
    MissingDocument { resource: &'static str },

    /// An identifier that does not parse.
    #[error("Invalid identifier: {0}.")]
    MalformedId(String),

    /// A write collided with a unique field.
    #[error("Duplicate field value: {value}. Please use another value.")]
    DuplicateField {
        field: &'static str,
        value: String,
    },

    /// Document validation failed.
    #[error("Invalid input data. {}", join_messages(.0))]
    Validation(Vec<FieldError>),

    /// A body that is not parseable into the expected shape.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    /// A query parameter that is not parseable.
    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),

    /// Per-client API quota exhausted.
    #[error("Too many requests from this IP. Please try again in an hour.")]
    RateLimited,

    /// Request body over the configured cap.
    #[error("Request body exceeds the {} byte limit.", MAX_BODY_BYTES)]
    PayloadTooLarge,

    /// Authentication required or failed.
    #[error("You are not logged in. Please log in to get access.")]
    Unauthorized,

    /// Anything unexpected: masked in production, logged internally.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

impl AppError {
    /// HTTP status classification.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } | AppError::MissingDocument { .. } => StatusCode::NOT_FOUND,
            AppError::MalformedId(_)
            | AppError::DuplicateField { .. }
            | AppError::Validation(_)
            | AppError::MalformedBody(_)
            | AppError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether this is an anticipated, user-facing failure.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }

    /// Client status label: "fail" for client faults, "error" for server
    /// faults.
    pub fn status_label(&self) -> &'static str {
        if self.status_code().is_client_error() {
            "fail"
        } else {
            "error"
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MalformedId(value) => AppError::MalformedId(value),
            StoreError::Duplicate { field, value } => AppError::DuplicateField { field, value },
            StoreError::NotFound { resource } => AppError::MissingDocument { resource },
            StoreError::Internal(message) => AppError::Internal(message),
        }
    }
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        AppError::Validation(errors)
    }
}

/// Client-facing failure body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Converts a failure into status plus body under the given mode.
///
/// Development exposes everything; production passes operational failures
/// through untouched and masks the rest behind a generic server fault.
pub fn translate(err: &AppError, mode: RunMode) -> (StatusCode, ErrorBody) {
    match mode {
        RunMode::Development => (
            err.status_code(),
            ErrorBody {
                status: err.status_label(),
                message: err.to_string(),
                error: Some(format!("{err:?}")),
                trace: Some(Backtrace::force_capture().to_string()),
            },
        ),
        RunMode::Production => {
            if err.is_operational() {
                (
                    err.status_code(),
                    ErrorBody {
                        status: err.status_label(),
                        message: err.to_string(),
                        error: None,
                        trace: None,
                    },
                )
            } else {
                tracing::error!(detail = %err, "unexpected failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        status: "error",
                        message: "Something went wrong.".to_string(),
                        error: None,
                        trace: None,
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = translate(&self, exposure());
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let not_found = AppError::NotFound {
            path: "/api/v1/nonexistent".to_string(),
        };
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.status_label(), "fail");

        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_label(),
            "error"
        );
        assert_eq!(
            AppError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_operational_flag() {
        assert!(AppError::RateLimited.is_operational());
        assert!(AppError::Validation(vec![]).is_operational());
        assert!(AppError::Unauthorized.is_operational());
        assert!(!AppError::Internal("boom".to_string()).is_operational());
    }

    #[test]
    fn test_not_found_message_carries_path() {
        let err = AppError::NotFound {
            path: "/api/v1/nonexistent".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unable to find /api/v1/nonexistent on this server."
        );
    }

    #[test]
    fn test_store_error_translation() {
        let err: AppError = StoreError::MalformedId("xyz".to_string()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid identifier: xyz.");

        let err: AppError = StoreError::Duplicate {
            field: "name",
            value: "The Forest Hiker".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Duplicate field value: The Forest Hiker. Please use another value."
        );

        let err: AppError = StoreError::NotFound { resource: "tour" }.into();
        assert_eq!(err.to_string(), "No tour found with that ID.");
    }

    #[test]
    fn test_same_fault_different_exposure() {
        let err = AppError::Internal("driver crashed".to_string());

        let (status, body) = translate(&err, RunMode::Development);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.message.contains("driver crashed"));
        assert!(body.error.is_some());
        assert!(body.trace.is_some());

        let (status, body) = translate(&err, RunMode::Production);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Something went wrong.");
        assert!(body.error.is_none());
        assert!(body.trace.is_none());
    }

    #[test]
    fn test_operational_failure_passes_through_in_production() {
        let err = AppError::RateLimited;
        let (status, body) = translate(&err, RunMode::Production);
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            body.message,
            "Too many requests from this IP. Please try again in an hour."
        );
        assert_eq!(body.status, "fail");
    }

    #[test]
    fn test_validation_messages_joined() {
        let err = AppError::Validation(vec![
            FieldError::new("name", "Tour name must have between 10 and 40 characters."),
            FieldError::new("priceDiscount", "Discount price (500) must be below regular price."),
        ]);
        let message = err.to_string();
        assert!(message.starts_with("Invalid input data. "));
        assert!(message.contains("regular price."));
    }
}
