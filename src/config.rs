use serde::Deserialize;

/// Minimum password length for sign-up and password changes.
/// One constant so the two flows can never drift apart.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub lifetime_days: i64,
    pub cookie_secure: bool,
}

/// Settings for the external identity-provider bearer path.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub provider: ProviderConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            lifetime_days: std::env::var("SESSION_LIFETIME_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
            cookie_secure: std::env::var("APP_ENV")
                .map(|v| v == "production")
                .unwrap_or(false),
        };
        let provider = ProviderConfig {
            secret: std::env::var("AUTH_PROVIDER_SECRET")?,
            issuer: std::env::var("AUTH_PROVIDER_ISSUER").unwrap_or_else(|_| "aquila-idp".into()),
            audience: std::env::var("AUTH_PROVIDER_AUDIENCE")
                .unwrap_or_else(|_| "aquila-users".into()),
        };
        Ok(Self {
            database_url,
            session,
            provider,
        })
    }
}
