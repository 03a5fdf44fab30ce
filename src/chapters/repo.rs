use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::authz::Owned;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Chapter {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owned for Chapter {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Chapter {
    pub async fn list_by_story(db: &PgPool, story_id: Uuid) -> anyhow::Result<Vec<Chapter>> {
        let rows = sqlx::query_as::<_, Chapter>(
            r#"
            SELECT id, story_id, user_id, title, position, created_at, updated_at
            FROM chapters
            WHERE story_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(story_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Chapter>> {
        let chapter = sqlx::query_as::<_, Chapter>(
            r#"
            SELECT id, story_id, user_id, title, position, created_at, updated_at
            FROM chapters
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(chapter)
    }

    /// When no position is given the chapter is appended after the story's
    /// current last one.
    pub async fn create(
        db: &PgPool,
        story_id: Uuid,
        user_id: Uuid,
        title: &str,
        position: Option<i32>,
    ) -> anyhow::Result<Chapter> {
        let chapter = sqlx::query_as::<_, Chapter>(
            r#"
            INSERT INTO chapters (story_id, user_id, title, position)
            VALUES (
                $1, $2, $3,
                COALESCE($4, (SELECT COALESCE(MAX(position), 0) + 1 FROM chapters WHERE story_id = $1))
            )
            RETURNING id, story_id, user_id, title, position, created_at, updated_at
            "#,
        )
        .bind(story_id)
        .bind(user_id)
        .bind(title)
        .bind(position)
        .fetch_one(db)
        .await?;
        Ok(chapter)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Chapter>> {
        let chapter = sqlx::query_as::<_, Chapter>(
            r#"
            UPDATE chapters
            SET title = COALESCE($2, title),
                position = COALESCE($3, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, story_id, user_id, title, position, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(position)
        .fetch_optional(db)
        .await?;
        Ok(chapter)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM chapters WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
