use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    authz::require_owned,
    error::ApiError,
    state::AppState,
    stories::repo::Story,
};

use super::repo::CharacterSetup;

pub fn setup_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/character-setups",
            get(list_setups).post(create_setup),
        )
        .route(
            "/character-setups/:id",
            get(get_setup).put(update_setup).delete(delete_setup),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateSetupRequest {
    pub story_id: Uuid,
    pub name: String,
    #[serde(default = "empty_traits")]
    pub traits: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSetupRequest {
    pub name: Option<String>,
    pub traits: Option<serde_json::Value>,
}

fn empty_traits() -> serde_json::Value {
    serde_json::json!({})
}

#[instrument(skip(state, user))]
async fn list_setups(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CharacterSetup>>, ApiError> {
    let setups = CharacterSetup::list_by_user(&state.db, user.id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(setups))
}

#[instrument(skip(state, user, payload))]
async fn create_setup(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateSetupRequest>,
) -> Result<(StatusCode, Json<CharacterSetup>), ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }

    let story = Story::find_by_id(&state.db, payload.story_id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(story, user.id, "Story")?;

    let setup = CharacterSetup::create(
        &state.db,
        user.id,
        payload.story_id,
        payload.name.trim(),
        &payload.traits,
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, setup_id = %setup.id, "character setup created");
    Ok((StatusCode::CREATED, Json(setup)))
}

#[instrument(skip(state, user))]
async fn get_setup(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CharacterSetup>, ApiError> {
    let setup = CharacterSetup::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    let setup = require_owned(setup, user.id, "Character setup")?;
    Ok(Json(setup))
}

#[instrument(skip(state, user, payload))]
async fn update_setup(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSetupRequest>,
) -> Result<Json<CharacterSetup>, ApiError> {
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::validation("Name must not be empty"));
        }
    }

    let existing = CharacterSetup::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Character setup")?;

    let setup = CharacterSetup::update(
        &state.db,
        id,
        payload.name.as_deref(),
        payload.traits.as_ref(),
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or(ApiError::NotFound("Character setup"))?;

    Ok(Json(setup))
}

#[instrument(skip(state, user))]
async fn delete_setup(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = CharacterSetup::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Character setup")?;

    CharacterSetup::delete(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(StatusCode::NO_CONTENT)
}
