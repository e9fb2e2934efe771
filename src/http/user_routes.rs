//! User resource routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::model::{NewUser, User, UserUpdate};

use super::extract::Payload;
use super::response::{deleted, DocumentEnvelope, ListEnvelope};
use super::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

fn to_doc(user: &User) -> AppResult<Value> {
    serde_json::to_value(user).map_err(|e| AppError::Internal(e.to_string()))
}

async fn list_users(State(state): State<AppState>) -> AppResult<ListEnvelope> {
    let users = state.store.list_users()?;
    let docs = users.iter().map(to_doc).collect::<AppResult<Vec<_>>>()?;
    Ok(ListEnvelope::new("users", docs, None))
}

async fn create_user(
    State(state): State<AppState>,
    Payload(payload): Payload<NewUser>,
) -> AppResult<(StatusCode, DocumentEnvelope)> {
    let user = User::from_new(payload)?;
    let user = state.store.insert_user(user)?;
    Ok(DocumentEnvelope::created("user", to_doc(&user)?))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<DocumentEnvelope> {
    let user = state.store.find_user(&id)?;
    Ok(DocumentEnvelope::new("user", to_doc(&user)?))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Payload(patch): Payload<UserUpdate>,
) -> AppResult<DocumentEnvelope> {
    let user = state.store.update_user(&id, patch)?;
    Ok(DocumentEnvelope::new("user", to_doc(&user)?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.store.delete_user(&id)?;
    Ok(deleted())
}
