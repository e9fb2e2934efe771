//! Review resource routes.
//!
//! Reviews reference a tour and a user by id; listing supports scoping to
//! one tour with `?tour=<id>`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::{NewReview, Review, ReviewUpdate};

use super::extract::{FilterParams, Payload};
use super::response::{deleted, DocumentEnvelope, ListEnvelope};
use super::AppState;

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route(
            "/:id",
            get(get_review).patch(update_review).delete(delete_review),
        )
}

fn to_doc(review: &Review) -> AppResult<Value> {
    serde_json::to_value(review).map_err(|e| AppError::Internal(e.to_string()))
}

async fn list_reviews(
    State(state): State<AppState>,
    params: FilterParams,
) -> AppResult<ListEnvelope> {
    let tour = match params.get("tour") {
        Some(raw) => Some(
            Uuid::parse_str(raw).map_err(|_| AppError::MalformedId(raw.to_string()))?,
        ),
        None => None,
    };

    let reviews = state.store.list_reviews(tour)?;
    let docs = reviews.iter().map(to_doc).collect::<AppResult<Vec<_>>>()?;
    Ok(ListEnvelope::new("reviews", docs, None))
}

async fn create_review(
    State(state): State<AppState>,
    Payload(payload): Payload<NewReview>,
) -> AppResult<(StatusCode, DocumentEnvelope)> {
    let review = Review::from_new(payload)?;
    let review = state.store.insert_review(review)?;
    Ok(DocumentEnvelope::created("review", to_doc(&review)?))
}

async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<DocumentEnvelope> {
    let review = state.store.find_review(&id)?;
    Ok(DocumentEnvelope::new("review", to_doc(&review)?))
}

async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(patch): Payload<ReviewUpdate>,
) -> AppResult<DocumentEnvelope> {
    let patch = patch.normalized()?;
    let review = state.store.update_review(&id, patch)?;
    Ok(DocumentEnvelope::new("review", to_doc(&review)?))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.store.delete_review(&id)?;
    Ok(deleted())
}
