use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    authz::require_owned,
    error::ApiError,
    state::AppState,
};

use super::dto::{
    is_supported_language, CreateStoryRequest, Pagination, StoryResponse, UpdateStoryRequest,
};
use super::repo::Story;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/stories", get(list_stories))
        .route("/stories/:id", get(get_story))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/stories", post(create_story))
        .route("/stories/:id", axum::routing::put(update_story).delete(delete_story))
}

#[instrument(skip(state, user))]
async fn list_stories(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<StoryResponse>>, ApiError> {
    let stories = Story::list_by_user(&state.db, user.id, p.limit, p.offset)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(stories.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user))]
async fn get_story(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StoryResponse>, ApiError> {
    let story = Story::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    let story = require_owned(story, user.id, "Story")?;
    Ok(Json(story.into()))
}

#[instrument(skip(state, user, payload))]
async fn create_story(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateStoryRequest>,
) -> Result<(StatusCode, Json<StoryResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if !is_supported_language(&payload.language) {
        return Err(ApiError::validation("Unsupported language"));
    }

    // Ownership of the new row comes from the principal, never the body.
    let story = Story::create(
        &state.db,
        user.id,
        payload.title.trim(),
        payload.summary.as_deref(),
        &payload.language,
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, story_id = %story.id, "story created");
    Ok((StatusCode::CREATED, Json(story.into())))
}

#[instrument(skip(state, user, payload))]
async fn update_story(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStoryRequest>,
) -> Result<Json<StoryResponse>, ApiError> {
    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::validation("Title must not be empty"));
        }
    }
    if let Some(language) = payload.language.as_deref() {
        if !is_supported_language(language) {
            return Err(ApiError::validation("Unsupported language"));
        }
    }

    let existing = Story::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Story")?;

    let story = Story::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.summary.as_deref(),
        payload.language.as_deref(),
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or(ApiError::NotFound("Story"))?;

    Ok(Json(story.into()))
}

#[instrument(skip(state, user))]
async fn delete_story(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = Story::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Story")?;

    Story::delete(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, story_id = %id, "story deleted");
    Ok(StatusCode::NO_CONTENT)
}
