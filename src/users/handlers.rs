use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        credentials::{is_unique_violation, User},
        dto::PublicUser,
        extractors::CurrentUser,
    },
    authz::require_self,
    error::ApiError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users/:id", get(get_user).put(update_user))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub username: Option<String>,
}

// These routes are keyed by a user id the caller already knows, so a mismatch
// is a plain 403 rather than the 404 masking used on resource routes.

#[instrument(skip(state, user))]
async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    require_self(id, user.id)?;
    let found = User::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(found.into()))
}

#[instrument(skip(state, user, payload))]
async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    require_self(id, user.id)?;

    if let Some(username) = payload.username.as_deref() {
        if username.trim().is_empty() {
            return Err(ApiError::validation("Username must not be empty"));
        }
    }

    let updated = User::update_profile(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.username.as_deref(),
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::conflict("Username already taken")
        } else {
            ApiError::Internal(e.into())
        }
    })?
    .ok_or(ApiError::NotFound("User"))?;

    info!(user_id = %id, "profile updated");
    Ok(Json(updated.into()))
}
