use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    authz::require_owned,
    chapters::repo::Chapter,
    error::ApiError,
    state::AppState,
};

use super::dto::{CreateSceneRequest, SceneResponse, UpdateSceneRequest};
use super::repo::Scene;

pub fn scene_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/chapters/:id/scenes",
            get(list_scenes).post(create_scene),
        )
        .route(
            "/scenes/:id",
            get(get_scene).put(update_scene).delete(delete_scene),
        )
}

#[instrument(skip(state, user))]
async fn list_scenes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chapter_id): Path<Uuid>,
) -> Result<Json<Vec<SceneResponse>>, ApiError> {
    let chapter = Chapter::find_by_id(&state.db, chapter_id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(chapter, user.id, "Chapter")?;

    let scenes = Scene::list_by_chapter(&state.db, chapter_id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(scenes.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user, payload))]
async fn create_scene(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(chapter_id): Path<Uuid>,
    Json(payload): Json<CreateSceneRequest>,
) -> Result<(StatusCode, Json<SceneResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let chapter = Chapter::find_by_id(&state.db, chapter_id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(chapter, user.id, "Chapter")?;

    let scene = Scene::create(
        &state.db,
        chapter_id,
        user.id,
        payload.title.trim(),
        &payload.content,
        payload.position,
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, scene_id = %scene.id, "scene created");
    Ok((StatusCode::CREATED, Json(scene.into())))
}

#[instrument(skip(state, user))]
async fn get_scene(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SceneResponse>, ApiError> {
    let scene = Scene::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    let scene = require_owned(scene, user.id, "Scene")?;
    Ok(Json(scene.into()))
}

#[instrument(skip(state, user, payload))]
async fn update_scene(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSceneRequest>,
) -> Result<Json<SceneResponse>, ApiError> {
    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::validation("Title must not be empty"));
        }
    }

    let existing = Scene::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Scene")?;

    let scene = Scene::update(
        &state.db,
        id,
        payload.title.as_deref(),
        payload.content.as_deref(),
        payload.position,
    )
    .await
    .map_err(ApiError::Internal)?
    .ok_or(ApiError::NotFound("Scene"))?;

    Ok(Json(scene.into()))
}

#[instrument(skip(state, user))]
async fn delete_scene(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = Scene::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Scene")?;

    Scene::delete(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, scene_id = %id, "scene deleted");
    Ok(StatusCode::NO_CONTENT)
}
