use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::authz::Owned;

/// A character sheet attached to a story. `traits` is free-form JSON; the
/// game renderer interprets it, the server just stores it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CharacterSetup {
    pub id: Uuid,
    pub user_id: Uuid,
    pub story_id: Uuid,
    pub name: String,
    pub traits: serde_json::Value,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Owned for CharacterSetup {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl CharacterSetup {
    pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<CharacterSetup>> {
        let rows = sqlx::query_as::<_, CharacterSetup>(
            r#"
            SELECT id, user_id, story_id, name, traits, created_at, updated_at
            FROM character_setups
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CharacterSetup>> {
        let setup = sqlx::query_as::<_, CharacterSetup>(
            r#"
            SELECT id, user_id, story_id, name, traits, created_at, updated_at
            FROM character_setups
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(setup)
    }

    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        story_id: Uuid,
        name: &str,
        traits: &serde_json::Value,
    ) -> anyhow::Result<CharacterSetup> {
        let setup = sqlx::query_as::<_, CharacterSetup>(
            r#"
            INSERT INTO character_setups (user_id, story_id, name, traits)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, story_id, name, traits, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(story_id)
        .bind(name)
        .bind(traits)
        .fetch_one(db)
        .await?;
        Ok(setup)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        traits: Option<&serde_json::Value>,
    ) -> anyhow::Result<Option<CharacterSetup>> {
        let setup = sqlx::query_as::<_, CharacterSetup>(
            r#"
            UPDATE character_setups
            SET name = COALESCE($2, name),
                traits = COALESCE($3, traits),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, story_id, name, traits, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(traits)
        .fetch_optional(db)
        .await?;
        Ok(setup)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM character_setups WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
