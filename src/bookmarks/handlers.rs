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
    scenes::repo::Scene,
    state::AppState,
    stories::repo::Story,
};

use super::repo::Bookmark;

pub fn bookmark_routes() -> Router<AppState> {
    Router::new()
        .route("/bookmarks", get(list_bookmarks).post(create_bookmark))
        .route("/bookmarks/:id", axum::routing::delete(delete_bookmark))
}

#[derive(Debug, Deserialize)]
pub struct CreateBookmarkRequest {
    pub story_id: Uuid,
    pub scene_id: Option<Uuid>,
}

#[instrument(skip(state, user))]
async fn list_bookmarks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let bookmarks = Bookmark::list_by_user(&state.db, user.id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(bookmarks))
}

#[instrument(skip(state, user, payload))]
async fn create_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<Bookmark>), ApiError> {
    // The referenced story (and scene, if any) must be the caller's own;
    // a foreign id gets the same 404 an absent one would.
    let story = Story::find_by_id(&state.db, payload.story_id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(story, user.id, "Story")?;

    if let Some(scene_id) = payload.scene_id {
        let scene = Scene::find_by_id(&state.db, scene_id)
            .await
            .map_err(ApiError::Internal)?;
        require_owned(scene, user.id, "Scene")?;
    }

    let bookmark = Bookmark::create(&state.db, user.id, payload.story_id, payload.scene_id)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, bookmark_id = %bookmark.id, "bookmark created");
    Ok((StatusCode::CREATED, Json(bookmark)))
}

#[instrument(skip(state, user))]
async fn delete_bookmark(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = Bookmark::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Bookmark")?;

    Bookmark::delete(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;

    Ok(StatusCode::NO_CONTENT)
}
