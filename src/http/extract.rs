//! Request extraction: payload parsing and query parameters.
//!
//! These extractors are where the parse/sanitize stages of the pipeline
//! become visible at the call site: [`Payload`] caps, parses and scrubs
//! bodies before deserializing, and [`FilterParams`] applies the
//! parameter-pollution rules while reading the raw query string.

use std::collections::HashMap;

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;
use crate::store::query::{
    FieldFilter, FieldSelection, FilterOp, SortKey, TourQuery, DEFAULT_LIMIT,
};

use super::sanitize;

/// Body size cap for JSON and url-encoded payloads.
pub const MAX_BODY_BYTES: usize = 10 * 1024;

/// Query parameters that may legitimately repeat; repeats are preserved as
/// lists. Everything else keeps only its last occurrence.
pub const MULTI_VALUE_FIELDS: &[&str] = &[
    "duration",
    "ratingsQuantity",
    "ratingsAverage",
    "maxGroupSize",
    "difficulty",
    "price",
];

/// Parameters consumed by the query builder rather than treated as filters.
const RESERVED_PARAMS: &[&str] = &["sort", "fields", "page", "limit"];

/// A sanitized request body, deserialized after the scrub passes.
///
/// Accepts JSON and url-encoded content, both capped at
/// [`MAX_BODY_BYTES`]; oversized bodies fail before any handler logic runs.
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let bytes = axum::body::Bytes::from_request(req, state)
            .await
            .map_err(|rejection| {
                if rejection.into_response().status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::PayloadTooLarge
                } else {
                    AppError::MalformedBody("unreadable request body".to_string())
                }
            })?;

        if bytes.len() > MAX_BODY_BYTES {
            return Err(AppError::PayloadTooLarge);
        }

        let raw: Value = if content_type.starts_with("application/x-www-form-urlencoded") {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&bytes)
                .map_err(|e| AppError::MalformedBody(e.to_string()))?;
            Value::Object(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect(),
            )
        } else {
            serde_json::from_slice(&bytes).map_err(|e| AppError::MalformedBody(e.to_string()))?
        };

        let clean = sanitize::scrub(raw);
        let parsed =
            serde_json::from_value(clean).map_err(|e| AppError::MalformedBody(e.to_string()))?;
        Ok(Payload(parsed))
    }
}

/// Parsed query parameters with pollution rules applied.
#[derive(Debug, Clone, Default)]
pub struct FilterParams {
    singles: HashMap<String, String>,
    lists: HashMap<String, Vec<String>>,
}

impl FilterParams {
    /// Parses a raw query string.
    ///
    /// Keys carrying operator characters are dropped, values are
    /// markup-escaped, and repeated parameters collapse to the last
    /// occurrence unless whitelisted in [`MULTI_VALUE_FIELDS`].
    pub fn parse(query: &str) -> Result<Self, AppError> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| AppError::InvalidQuery(e.to_string()))?;

        let mut params = Self::default();
        for (key, value) in pairs {
            if key.starts_with('$') || key.contains('.') {
                continue;
            }
            let value = sanitize::escape_text(&value);
            if !key.contains('[') && MULTI_VALUE_FIELDS.contains(&key.as_str()) {
                params.lists.entry(key).or_default().push(value);
            } else {
                params.singles.insert(key, value);
            }
        }
        Ok(params)
    }

    /// Last-wins lookup of a single-valued parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.singles
            .get(key)
            .map(String::as_str)
            .or_else(|| self.lists.get(key).and_then(|v| v.last()).map(String::as_str))
    }

    /// All preserved values of a whitelisted parameter.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.lists.get(key).map(Vec::as_slice)
    }

    /// Builds the tour query this request asked for, on top of the
    /// standard read scope.
    pub fn tour_query(&self) -> Result<TourQuery, AppError> {
        let mut query = TourQuery::new();

        for (key, value) in &self.singles {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            let (field, op) = split_filter_key(key)?;
            query = query.filter(FieldFilter::new(field, op, parse_scalar(value)));
        }

        for (key, values) in &self.lists {
            let filter = if values.len() == 1 {
                FieldFilter::new(key.clone(), FilterOp::Eq, parse_scalar(&values[0]))
            } else {
                FieldFilter::new(
                    key.clone(),
                    FilterOp::In,
                    Value::Array(values.iter().map(|v| parse_scalar(v)).collect()),
                )
            };
            query = query.filter(filter);
        }

        if let Some(sort) = self.get("sort") {
            query = query.sort_by(parse_sort(sort));
        }
        if let Some(fields) = self.get("fields") {
            query = query.select(parse_fields(fields));
        }

        let page = parse_count(self.get("page"), "page")?.unwrap_or(1);
        let limit = parse_count(self.get("limit"), "limit")?.unwrap_or(DEFAULT_LIMIT);
        Ok(query.paginate(page, limit))
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for FilterParams {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.uri.query() {
            Some(query) => Self::parse(query),
            None => Ok(Self::default()),
        }
    }
}

/// Splits `price[gte]` into field and operator; bare keys mean equality.
fn split_filter_key(key: &str) -> Result<(String, FilterOp), AppError> {
    match key.find('[') {
        Some(open) if key.ends_with(']') => {
            let field = &key[..open];
            let op_str = &key[open + 1..key.len() - 1];
            let op = FilterOp::parse(op_str)
                .ok_or_else(|| AppError::InvalidQuery(format!("unknown operator: {op_str}")))?;
            Ok((field.to_string(), op))
        }
        Some(_) => Err(AppError::InvalidQuery(format!("malformed key: {key}"))),
        None => Ok((key.to_string(), FilterOp::Eq)),
    }
}

/// Parses a filter value into the closest JSON scalar.
fn parse_scalar(raw: &str) -> Value {
    if raw == "true" {
        return Value::Bool(true);
    }
    if raw == "false" {
        return Value::Bool(false);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = raw.parse::<f64>() {
        if let Some(number) = serde_json::Number::from_f64(n) {
            return Value::Number(number);
        }
    }
    Value::String(raw.to_string())
}

/// Parses `-price,ratingsAverage` style sort lists.
fn parse_sort(raw: &str) -> Vec<SortKey> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| match part.strip_prefix('-') {
            Some(field) => SortKey {
                field: field.to_string(),
                ascending: false,
            },
            None => SortKey {
                field: part.to_string(),
                ascending: true,
            },
        })
        .collect()
}

/// Parses a field list; a list of `-` prefixed names is an exclusion.
fn parse_fields(raw: &str) -> FieldSelection {
    let parts: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    if !parts.is_empty() && parts.iter().all(|part| part.starts_with('-')) {
        FieldSelection::Exclude(
            parts
                .iter()
                .map(|part| part.trim_start_matches('-').to_string())
                .collect(),
        )
    } else {
        FieldSelection::Include(
            parts
                .iter()
                .filter(|part| !part.starts_with('-'))
                .map(|part| (*part).to_string())
                .collect(),
        )
    }
}

fn parse_count(raw: Option<&str>, key: &'static str) -> Result<Option<usize>, AppError> {
    match raw {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::InvalidQuery(format!("invalid {key}: {value}"))),
    }
}
