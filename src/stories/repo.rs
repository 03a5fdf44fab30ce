use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::authz::Owned;

/// A story: the top of the fiction hierarchy (story → chapter → scene).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Story {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub language: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owned for Story {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Story {
    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Story>> {
        let rows = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, user_id, title, summary, language, created_at, updated_at
            FROM stories
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Unscoped fetch; the ownership decision belongs to the authorizer, not
    /// this query.
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Story>> {
        let story = sqlx::query_as::<_, Story>(
            r#"
            SELECT id, user_id, title, summary, language, created_at, updated_at
            FROM stories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(story)
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        title: &str,
        summary: Option<&str>,
        language: &str,
    ) -> anyhow::Result<Story> {
        let story = sqlx::query_as::<_, Story>(
            r#"
            INSERT INTO stories (user_id, title, summary, language)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, summary, language, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(summary)
        .bind(language)
        .fetch_one(db)
        .await?;
        Ok(story)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: Option<&str>,
        summary: Option<&str>,
        language: Option<&str>,
    ) -> anyhow::Result<Option<Story>> {
        let story = sqlx::query_as::<_, Story>(
            r#"
            UPDATE stories
            SET title = COALESCE($2, title),
                summary = COALESCE($3, summary),
                language = COALESCE($4, language),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, title, summary, language, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(summary)
        .bind(language)
        .fetch_optional(db)
        .await?;
        Ok(story)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
