use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;

/// Principal as asserted by the external identity provider. Carries the
/// provider's subject id, not a local user id; the two address spaces are
/// never mixed.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSession {
    pub subject: String,
    pub email: Option<String>,
}

/// Seam for the third-party identity provider. The provider's internals are
/// out of scope; this is the whole surface the app consumes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Validate a bearer token. Malformed, expired and mis-issued tokens are
    /// all `None`.
    async fn get_session(&self, bearer: &str) -> Option<ProviderSession>;

    async fn sign_out(&self, bearer: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Deserialize)]
struct ProviderClaims {
    sub: String,
    email: Option<String>,
}

/// Provider backed by issuer/audience-validated signed tokens. Tokens are
/// stateless on our side, so `sign_out` has nothing local to revoke.
pub struct TokenProvider {
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenProvider {
    pub fn new(config: &ProviderConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(std::slice::from_ref(&config.issuer));
        validation.set_audience(std::slice::from_ref(&config.audience));
        Self {
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl IdentityProvider for TokenProvider {
    async fn get_session(&self, bearer: &str) -> Option<ProviderSession> {
        match decode::<ProviderClaims>(bearer, &self.decoding, &self.validation) {
            Ok(data) => Some(ProviderSession {
                subject: data.claims.sub,
                email: data.claims.email,
            }),
            Err(e) => {
                debug!(error = %e, "provider token rejected");
                None
            }
        }
    }

    async fn sign_out(&self, _bearer: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::{Duration, OffsetDateTime};

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        email: Option<String>,
        iss: String,
        aud: String,
        exp: usize,
    }

    fn config() -> ProviderConfig {
        ProviderConfig {
            secret: "test-provider-secret".into(),
            issuer: "test-idp".into(),
            audience: "test-users".into(),
        }
    }

    fn token(iss: &str, aud: &str, ttl: Duration) -> String {
        let exp = (OffsetDateTime::now_utc() + ttl).unix_timestamp() as usize;
        let claims = TestClaims {
            sub: "provider-user-1".into(),
            email: Some("user@example.com".into()),
            iss: iss.into(),
            aud: aud.into(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config().secret.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_a_well_formed_token() {
        let provider = TokenProvider::new(&config());
        let session = provider
            .get_session(&token("test-idp", "test-users", Duration::minutes(5)))
            .await
            .expect("valid token");
        assert_eq!(session.subject, "provider-user-1");
        assert_eq!(session.email.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn rejects_wrong_issuer_and_audience() {
        let provider = TokenProvider::new(&config());
        assert!(provider
            .get_session(&token("other-idp", "test-users", Duration::minutes(5)))
            .await
            .is_none());
        assert!(provider
            .get_session(&token("test-idp", "other-users", Duration::minutes(5)))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn rejects_expired_and_garbage_tokens() {
        let provider = TokenProvider::new(&config());
        assert!(provider
            .get_session(&token("test-idp", "test-users", Duration::minutes(-5)))
            .await
            .is_none());
        assert!(provider.get_session("not-a-token").await.is_none());
        assert!(provider.get_session("").await.is_none());
    }

    #[tokio::test]
    async fn sign_out_is_a_no_op_for_stateless_tokens() {
        let provider = TokenProvider::new(&config());
        provider.sign_out("whatever").await.unwrap();
    }
}
