//! Success envelopes.
//!
//! Failure shapes are owned by the error translation layer; handlers only
//! build these.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Envelope for list endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
    pub results: usize,
    pub data: Value,
}

impl ListEnvelope {
    /// Wraps a document list under the given resource key.
    pub fn new(resource: &str, docs: Vec<Value>, requested_at: Option<DateTime<Utc>>) -> Self {
        let results = docs.len();
        let mut data = serde_json::Map::new();
        data.insert(resource.to_string(), Value::Array(docs));
        Self {
            status: "success",
            requested_at,
            results,
            data: Value::Object(data),
        }
    }
}

impl IntoResponse for ListEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Envelope for single-document endpoints.
#[derive(Debug, Serialize)]
pub struct DocumentEnvelope {
    pub status: &'static str,
    pub data: Value,
}

impl DocumentEnvelope {
    pub fn new(resource: &str, doc: Value) -> Self {
        let mut data = serde_json::Map::new();
        data.insert(resource.to_string(), doc);
        Self {
            status: "success",
            data: Value::Object(data),
        }
    }

    /// The envelope with a 201 status, for create endpoints.
    pub fn created(resource: &str, doc: Value) -> (StatusCode, Self) {
        (StatusCode::CREATED, Self::new(resource, doc))
    }
}

impl IntoResponse for DocumentEnvelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Empty 204 response for delete endpoints.
pub fn deleted() -> StatusCode {
    StatusCode::NO_CONTENT
}
