use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Chapter;

#[derive(Debug, Deserialize)]
pub struct CreateChapterRequest {
    pub title: String,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateChapterRequest {
    pub title: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ChapterResponse {
    pub id: Uuid,
    pub story_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Chapter> for ChapterResponse {
    fn from(c: Chapter) -> Self {
        Self {
            id: c.id,
            story_id: c.story_id,
            title: c.title,
            position: c.position,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}
