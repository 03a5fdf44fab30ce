use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::Scene;

#[derive(Debug, Deserialize)]
pub struct CreateSceneRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSceneRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct SceneResponse {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub title: String,
    pub content: String,
    pub position: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Scene> for SceneResponse {
    fn from(s: Scene) -> Self {
        Self {
            id: s.id,
            chapter_id: s.chapter_id,
            title: s.title,
            content: s.content,
            position: s.position,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
