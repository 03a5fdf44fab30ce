use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::authz::Owned;

/// A reader's place marker: a story, optionally pinned to a scene.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub story_id: Uuid,
    pub scene_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

impl Owned for Bookmark {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Bookmark {
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Bookmark>> {
        let rows = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, story_id, scene_id, created_at
            FROM bookmarks
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Bookmark>> {
        let bookmark = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, story_id, scene_id, created_at
            FROM bookmarks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(bookmark)
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        story_id: Uuid,
        scene_id: Option<Uuid>,
    ) -> anyhow::Result<Bookmark> {
        let bookmark = sqlx::query_as::<_, Bookmark>(
            r#"
            INSERT INTO bookmarks (user_id, story_id, scene_id)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, story_id, scene_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(story_id)
        .bind(scene_id)
        .fetch_one(db)
        .await?;
        Ok(bookmark)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM bookmarks WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
