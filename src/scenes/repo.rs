use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::authz::Owned;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Scene {
    pub id: Uuid,
    pub chapter_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub position: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owned for Scene {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Scene {
    pub async fn list_by_chapter(db: &PgPool, chapter_id: Uuid) -> anyhow::Result<Vec<Scene>> {
        let rows = sqlx::query_as::<_, Scene>(
            r#"
            SELECT id, chapter_id, user_id, title, content, position, created_at, updated_at
            FROM scenes
            WHERE chapter_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(chapter_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Scene>> {
        let scene = sqlx::query_as::<_, Scene>(
            r#"
            SELECT id, chapter_id, user_id, title, content, position, created_at, updated_at
            FROM scenes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(scene)
    }

    pub async fn create(
        db: &PgPool,
        chapter_id: Uuid,
        user_id: Uuid,
        title: &str,
        content: &str,
        position: Option<i32>,
    ) -> anyhow::Result<Scene> {
        let scene = sqlx::query_as::<_, Scene>(
            r#"
            INSERT INTO scenes (chapter_id, user_id, title, content, position)
            VALUES (
                $1, $2, $3, $4,
                COALESCE($5, (SELECT COALESCE(MAX(position), 0) + 1 FROM scenes WHERE chapter_id = $1))
            )
            RETURNING id, chapter_id, user_id, title, content, position, created_at, updated_at
            "#,
        )
        .bind(chapter_id)
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(position)
        .fetch_one(db)
        .await?;
        Ok(scene)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
        position: Option<i32>,
    ) -> anyhow::Result<Option<Scene>> {
        let scene = sqlx::query_as::<_, Scene>(
            r#"
            UPDATE scenes
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                position = COALESCE($4, position),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, chapter_id, user_id, title, content, position, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(position)
        .fetch_optional(db)
        .await?;
        Ok(scene)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM scenes WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
