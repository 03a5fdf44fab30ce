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
    error::ApiError,
    state::AppState,
    stories::repo::Story,
};

use super::dto::{ChapterResponse, CreateChapterRequest, UpdateChapterRequest};
use super::repo::Chapter;

pub fn chapter_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/stories/:id/chapters",
            get(list_chapters).post(create_chapter),
        )
        .route(
            "/chapters/:id",
            get(get_chapter).put(update_chapter).delete(delete_chapter),
        )
}

#[instrument(skip(state, user))]
async fn list_chapters(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(story_id): Path<Uuid>,
) -> Result<Json<Vec<ChapterResponse>>, ApiError> {
    let story = Story::find_by_id(&state.db, story_id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(story, user.id, "Story")?;

    let chapters = Chapter::list_by_story(&state.db, story_id)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(chapters.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, user, payload))]
async fn create_chapter(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(story_id): Path<Uuid>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<(StatusCode, Json<ChapterResponse>), ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let story = Story::find_by_id(&state.db, story_id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(story, user.id, "Story")?;

    let chapter = Chapter::create(
        &state.db,
        story_id,
        user.id,
        payload.title.trim(),
        payload.position,
    )
    .await
    .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, chapter_id = %chapter.id, "chapter created");
    Ok((StatusCode::CREATED, Json(chapter.into())))
}

#[instrument(skip(state, user))]
async fn get_chapter(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ChapterResponse>, ApiError> {
    let chapter = Chapter::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    let chapter = require_owned(chapter, user.id, "Chapter")?;
    Ok(Json(chapter.into()))
}

#[instrument(skip(state, user, payload))]
async fn update_chapter(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<Json<ChapterResponse>, ApiError> {
    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::validation("Title must not be empty"));
        }
    }

    let existing = Chapter::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Chapter")?;

    let chapter = Chapter::update(&state.db, id, payload.title.as_deref(), payload.position)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::NotFound("Chapter"))?;

    Ok(Json(chapter.into()))
}

#[instrument(skip(state, user))]
async fn delete_chapter(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let existing = Chapter::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;
    require_owned(existing, user.id, "Chapter")?;

    Chapter::delete(&state.db, id)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, chapter_id = %id, "chapter deleted");
    Ok(StatusCode::NO_CONTENT)
}
