//! Tour resource routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Extension, Router};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::RequestTime;
use crate::model::{NewTour, Tour, TourUpdate};
use crate::store::query::{FieldSelection, SortKey, TourQuery};

use super::extract::{FilterParams, Payload};
use super::response::{deleted, DocumentEnvelope, ListEnvelope};
use super::AppState;

pub fn tour_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tours).post(create_tour))
        .route("/top-5-cheap", get(top_tours))
        .route("/stats", get(tour_stats))
        .route("/:id", get(get_tour).patch(update_tour).delete(delete_tour))
}

async fn list_tours(
    State(state): State<AppState>,
    requested_at: Option<Extension<RequestTime>>,
    params: FilterParams,
) -> AppResult<ListEnvelope> {
    let query = params.tour_query()?;
    let docs = state.store.query_tours(&query)?;
    Ok(ListEnvelope::new(
        "tours",
        docs,
        requested_at.map(|Extension(RequestTime(at))| at),
    ))
}

/// Alias listing: the five best-rated tours, cheapest first among equals.
async fn top_tours(State(state): State<AppState>) -> AppResult<ListEnvelope> {
    let query = TourQuery::new()
        .sort_by(vec![
            SortKey {
                field: "ratingsAverage".to_string(),
                ascending: false,
            },
            SortKey {
                field: "price".to_string(),
                ascending: true,
            },
        ])
        .select(FieldSelection::Include(vec![
            "name".to_string(),
            "price".to_string(),
            "ratingsAverage".to_string(),
            "summary".to_string(),
            "difficulty".to_string(),
        ]))
        .paginate(1, 5);

    let docs = state.store.query_tours(&query)?;
    Ok(ListEnvelope::new("tours", docs, None))
}

async fn tour_stats(State(state): State<AppState>) -> AppResult<DocumentEnvelope> {
    let stats = state.store.tour_stats()?;
    let doc = serde_json::to_value(stats).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(DocumentEnvelope::new("stats", doc))
}

async fn create_tour(
    State(state): State<AppState>,
    Payload(payload): Payload<NewTour>,
) -> AppResult<(StatusCode, DocumentEnvelope)> {
    let tour = Tour::from_new(payload)?;
    let tour = state.store.insert_tour(tour)?;
    let doc: Value =
        serde_json::to_value(&tour).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(DocumentEnvelope::created("tour", doc))
}

async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<DocumentEnvelope> {
    let query = TourQuery::new().with_reviews();
    let doc = state.store.find_tour(&id, &query)?;
    Ok(DocumentEnvelope::new("tour", doc))
}

async fn update_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(patch): Payload<TourUpdate>,
) -> AppResult<DocumentEnvelope> {
    let patch = patch.normalized()?;
    let doc = state.store.update_tour(&id, patch)?;
    Ok(DocumentEnvelope::new("tour", doc))
}

async fn delete_tour(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.store.delete_tour(&id)?;
    Ok(deleted())
}
