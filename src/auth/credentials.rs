use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::auth::password;
use crate::config::MIN_PASSWORD_LEN;

const EMAIL_PROVIDER: &str = "email";

/// User identity record. The password hash lives in `credentials`, never here,
/// so serializing a user can't leak it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
struct UserWithHash {
    id: Uuid,
    email: String,
    name: Option<String>,
    username: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    password_hash: String,
}

impl UserWithHash {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            username: self.username,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Error)]
pub enum SignUpError {
    #[error("Email already registered")]
    AlreadyExists,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ChangePasswordError {
    #[error("Current password is incorrect")]
    CurrentPasswordInvalid,
    #[error("Password too short")]
    TooShort,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Uniqueness and lookups run on this form; the stored value is normalized
/// too, so no `LOWER()` indexes are needed.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Argon2 is deliberately slow; both hash and verify go through the blocking
/// pool so a sign-in burst can't stall unrelated requests.
async fn hash_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| anyhow::anyhow!("hash task failed: {e}"))?
}

async fn verify_blocking(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &hash))
        .await
        .map_err(|e| anyhow::anyhow!("verify task failed: {e}"))?
}

async fn dummy_verify_blocking(plain: String) {
    let _ = tokio::task::spawn_blocking(move || password::dummy_verify(&plain)).await;
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, username, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, username, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        name: Option<&str>,
        username: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, username, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(username)
        .fetch_optional(db)
        .await
    }
}

/// Creates the user row and its "email" credential in one transaction: both or
/// neither. A lost race against a concurrent sign-up with the same email
/// surfaces as the unique violation and maps to `AlreadyExists`, so at most
/// one of the racers wins.
pub async fn sign_up(
    db: &PgPool,
    email: &str,
    plain_password: &str,
    name: Option<&str>,
) -> Result<User, SignUpError> {
    let email = normalize_email(email);

    // Friendly pre-check saves an argon2 run on the common duplicate case;
    // the unique index is what actually decides races.
    if User::find_by_email(db, &email)
        .await
        .map_err(SignUpError::Other)?
        .is_some()
    {
        return Err(SignUpError::AlreadyExists);
    }

    let hash = hash_blocking(plain_password.to_string())
        .await
        .map_err(SignUpError::Other)?;

    let mut tx = db.begin().await.map_err(anyhow::Error::from)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, name)
        VALUES ($1, $2)
        RETURNING id, email, name, username, created_at, updated_at
        "#,
    )
    .bind(&email)
    .bind(name)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            SignUpError::AlreadyExists
        } else {
            SignUpError::Other(e.into())
        }
    })?;

    sqlx::query(
        r#"
        INSERT INTO credentials (user_id, provider, password_hash)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user.id)
    .bind(EMAIL_PROVIDER)
    .bind(&hash)
    .execute(&mut *tx)
    .await
    .map_err(anyhow::Error::from)?;

    tx.commit().await.map_err(anyhow::Error::from)?;
    Ok(user)
}

/// Unknown email, wrong password and hash errors all collapse to `None`, and
/// the unknown-email path still pays for one verify so the two failures are
/// indistinguishable by latency as well as by response.
pub async fn sign_in(
    db: &PgPool,
    email: &str,
    plain_password: &str,
) -> anyhow::Result<Option<User>> {
    let email = normalize_email(email);

    let row = sqlx::query_as::<_, UserWithHash>(
        r#"
        SELECT u.id, u.email, u.name, u.username, u.created_at, u.updated_at,
               c.password_hash
        FROM users u
        JOIN credentials c ON c.user_id = u.id AND c.provider = $2
        WHERE u.email = $1
        "#,
    )
    .bind(&email)
    .bind(EMAIL_PROVIDER)
    .fetch_optional(db)
    .await?;

    let Some(row) = row else {
        dummy_verify_blocking(plain_password.to_string()).await;
        return Ok(None);
    };

    match verify_blocking(plain_password.to_string(), row.password_hash.clone()).await {
        Ok(true) => Ok(Some(row.into_user())),
        Ok(false) => Ok(None),
        Err(e) => {
            warn!(error = %e, "password verify errored; treating as invalid credentials");
            Ok(None)
        }
    }
}

/// A live session alone never authorizes a password change; the caller must
/// re-prove the current secret first. On any failure the stored hash is left
/// untouched.
pub async fn change_password(
    db: &PgPool,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> Result<(), ChangePasswordError> {
    if new_password.len() < MIN_PASSWORD_LEN {
        return Err(ChangePasswordError::TooShort);
    }

    let stored: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT password_hash
        FROM credentials
        WHERE user_id = $1 AND provider = $2
        "#,
    )
    .bind(user_id)
    .bind(EMAIL_PROVIDER)
    .fetch_optional(db)
    .await
    .map_err(anyhow::Error::from)?;

    let Some((stored_hash,)) = stored else {
        dummy_verify_blocking(current_password.to_string()).await;
        return Err(ChangePasswordError::CurrentPasswordInvalid);
    };

    let ok = verify_blocking(current_password.to_string(), stored_hash)
        .await
        .map_err(ChangePasswordError::Other)?;
    if !ok {
        return Err(ChangePasswordError::CurrentPasswordInvalid);
    }

    let new_hash = hash_blocking(new_password.to_string())
        .await
        .map_err(ChangePasswordError::Other)?;

    sqlx::query(
        r#"
        UPDATE credentials
        SET password_hash = $3, updated_at = NOW()
        WHERE user_id = $1 AND provider = $2
        "#,
    )
    .bind(user_id)
    .bind(EMAIL_PROVIDER)
    .bind(&new_hash)
    .execute(db)
    .await
    .map_err(anyhow::Error::from)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
        assert_eq!(normalize_email("plain@example.com"), "plain@example.com");
    }

    #[test]
    fn email_shape_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("user@no-dot"));
        assert!(!is_valid_email("spaced user@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn error_messages_are_the_literal_api_bodies() {
        assert_eq!(SignUpError::AlreadyExists.to_string(), "Email already registered");
        assert_eq!(
            ChangePasswordError::CurrentPasswordInvalid.to_string(),
            "Current password is incorrect"
        );
        assert_eq!(ChangePasswordError::TooShort.to_string(), "Password too short");
    }
}
