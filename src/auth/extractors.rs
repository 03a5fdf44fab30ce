use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::provider::ProviderSession;
use crate::auth::sessions::{ClientInfo, Principal, Session};
use crate::error::ApiError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// Cookie-session principal. Resolved exactly once, before the handler body
/// runs; missing cookie, malformed token, unknown token and expired token all
/// reject the same way.
pub struct CurrentUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let raw = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ApiError::Unauthorized)?;

        // Session tokens are UUIDs; anything else can't be in the table, so
        // skip the lookup.
        let token: Uuid = raw.parse().map_err(|_| ApiError::Unauthorized)?;

        let principal = Session::resolve(&state.db, token)
            .await
            .ok_or(ApiError::Unauthorized)?;
        Ok(CurrentUser(principal))
    }
}

/// Bearer-path principal, validated by the external identity provider. Routes
/// use either this or `CurrentUser`, never both.
pub struct ProviderUser(pub ProviderSession);

#[async_trait]
impl FromRequestParts<AppState> for ProviderUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        let session = state
            .provider
            .get_session(token)
            .await
            .ok_or(ApiError::Unauthorized)?;
        Ok(ProviderUser(session))
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Audit metadata recorded on the session row at sign-in.
pub(crate) fn client_info(headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        ip_address: headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string()),
        user_agent: headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn current_user_rejects_missing_cookie() {
        let state = AppState::fake();
        let mut parts = parts_with(&[]);
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn current_user_rejects_non_uuid_token() {
        let state = AppState::fake();
        let mut parts = parts_with(&[("cookie", "session=not-a-uuid")]);
        let err = CurrentUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn provider_user_rejects_missing_and_malformed_headers() {
        let state = AppState::fake();

        let mut parts = parts_with(&[]);
        assert!(ProviderUser::from_request_parts(&mut parts, &state)
            .await
            .is_err());

        let mut parts = parts_with(&[("authorization", "Basic abc")]);
        assert!(ProviderUser::from_request_parts(&mut parts, &state)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn provider_user_accepts_a_provider_validated_token() {
        let state = AppState::fake();
        let mut parts = parts_with(&[("authorization", "Bearer fake-subject-7")]);
        let ProviderUser(session) = ProviderUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(session.subject, "subject-7");
    }

    #[test]
    fn bearer_token_requires_the_exact_scheme() {
        let parts = parts_with(&[("authorization", "Bearer abc123")]);
        assert_eq!(bearer_token(&parts.headers), Some("abc123"));

        let parts = parts_with(&[("authorization", "bearer abc123")]);
        assert_eq!(bearer_token(&parts.headers), None);
    }

    #[test]
    fn client_info_takes_the_first_forwarded_hop() {
        let parts = parts_with(&[
            ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
            ("user-agent", "aquila-test/1.0"),
        ]);
        let info = client_info(&parts.headers);
        assert_eq!(info.ip_address.as_deref(), Some("203.0.113.9"));
        assert_eq!(info.user_agent.as_deref(), Some("aquila-test/1.0"));
    }
}
