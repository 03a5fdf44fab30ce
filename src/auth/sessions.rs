use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tracing::{debug, error};
use uuid::Uuid;

/// The identity a request runs as once its token has been resolved. Distinct
/// from the raw token; handlers only ever see this.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub username: Option<String>,
}

/// Client details captured at sign-in. Audit only, never consulted when
/// authorizing a request.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// One session row. The id is the opaque bearer token: a UUIDv4, so 122 bits
/// of CSPRNG output with no decodable structure.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, FromRow)]
struct ResolvedRow {
    expires_at: OffsetDateTime,
    user_id: Uuid,
    email: String,
    name: Option<String>,
    username: Option<String>,
}

impl Session {
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }

    /// Mint a fresh session for a signed-in user. One durable write; a new
    /// sign-in never revives an old token.
    pub async fn create(
        db: &PgPool,
        user_id: Uuid,
        lifetime: Duration,
        client: ClientInfo,
    ) -> anyhow::Result<Session> {
        let now = OffsetDateTime::now_utc();
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, created_at, expires_at, ip_address, user_agent
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(now)
        .bind(now + lifetime)
        .bind(client.ip_address)
        .bind(client.user_agent)
        .fetch_one(db)
        .await?;
        debug!(user_id = %user_id, session_id = %session.id, "session created");
        Ok(session)
    }

    /// Token to principal. Absent rows, expired rows and lookup errors are
    /// all the same `None`; expiry is checked here on every lookup, not just
    /// at creation, and nothing about the failure mode reaches the caller.
    pub async fn resolve(db: &PgPool, token: Uuid) -> Option<Principal> {
        let row = sqlx::query_as::<_, ResolvedRow>(
            r#"
            SELECT s.expires_at, u.id AS user_id, u.email, u.name, u.username
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await;

        let row = match row {
            Ok(r) => r?,
            Err(e) => {
                let correlation_id = Uuid::new_v4();
                error!(error = %e, %correlation_id, "session lookup failed");
                return None;
            }
        };

        if OffsetDateTime::now_utc() >= row.expires_at {
            debug!(user_id = %row.user_id, "session expired");
            return None;
        }

        Some(Principal {
            id: row.user_id,
            email: row.email,
            name: row.name,
            username: row.username,
        })
    }

    /// Idempotent: revoking an absent or already-revoked token is a no-op.
    pub async fn revoke(db: &PgPool, token: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(token)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Storage hygiene only. Lazy expiry in `resolve` is what keeps expired
    /// tokens unusable; this just reclaims the rows.
    pub async fn sweep_expired(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(OffsetDateTime::now_utc())
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_lifetime(lifetime: Duration) -> (Session, OffsetDateTime) {
        let created = OffsetDateTime::now_utc();
        let session = Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            created_at: created,
            expires_at: created + lifetime,
            ip_address: None,
            user_agent: None,
        };
        (session, created)
    }

    #[test]
    fn valid_at_creation() {
        let (session, created) = session_with_lifetime(Duration::days(7));
        assert!(session.is_valid_at(created));
    }

    #[test]
    fn invalid_exactly_at_expiry() {
        let lifetime = Duration::days(7);
        let (session, created) = session_with_lifetime(lifetime);
        assert!(!session.is_valid_at(created + lifetime));
    }

    #[test]
    fn invalid_one_millisecond_past_expiry() {
        let lifetime = Duration::days(7);
        let (session, created) = session_with_lifetime(lifetime);
        assert!(!session.is_valid_at(created + lifetime + Duration::milliseconds(1)));
    }

    #[test]
    fn valid_one_millisecond_before_expiry() {
        let lifetime = Duration::days(7);
        let (session, created) = session_with_lifetime(lifetime);
        assert!(session.is_valid_at(created + lifetime - Duration::milliseconds(1)));
    }
}
