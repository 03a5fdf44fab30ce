use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use serde_json::json;
use time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        credentials::{self, is_valid_email, ChangePasswordError, SignUpError},
        dto::{ChangePasswordRequest, PublicUser, SignInRequest, SignUpRequest},
        extractors::{bearer_token, client_info, CurrentUser, ProviderUser, SESSION_COOKIE},
        sessions::Session,
    },
    config::MIN_PASSWORD_LEN,
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/password", put(change_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// The identity-provider bearer path. Kept apart from the cookie routes; the
/// two token sources are never accepted by the same handler.
pub fn external_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/external/session", get(external_session))
        .route("/auth/external/sign-out", post(external_sign_out))
}

fn session_cookie(token: Uuid, lifetime: Duration, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(lifetime);
    cookie.set_secure(secure);
    cookie
}

fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(Duration::ZERO);
    cookie.set_secure(secure);
    cookie
}

#[instrument(skip(state, headers, jar, payload))]
async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(mut payload): Json<SignUpRequest>,
) -> Result<(StatusCode, CookieJar, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!("sign-up with invalid email shape");
        return Err(ApiError::validation("Invalid email"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("sign-up password too short");
        return Err(ApiError::validation("Password too short"));
    }

    let user = credentials::sign_up(
        &state.db,
        &payload.email,
        &payload.password,
        payload.name.as_deref(),
    )
    .await
    .map_err(|e| match e {
        // The one deliberate existence leak: the caller asserted this email
        // themselves on the form.
        SignUpError::AlreadyExists => ApiError::conflict("Email already registered"),
        SignUpError::Other(e) => ApiError::Internal(e),
    })?;

    let lifetime = Duration::days(state.config.session.lifetime_days);
    let session = Session::create(&state.db, user.id, lifetime, client_info(&headers))
        .await
        .map_err(ApiError::Internal)?;

    let jar = jar.add(session_cookie(
        session.id,
        lifetime,
        state.config.session.cookie_secure,
    ));

    info!(user_id = %user.id, "user signed up");
    Ok((StatusCode::CREATED, jar, Json(user.into())))
}

#[instrument(skip(state, headers, jar, payload))]
async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(mut payload): Json<SignInRequest>,
) -> Result<(CookieJar, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // One response for unknown email, wrong password, and verify errors.
    let user = credentials::sign_in(&state.db, &payload.email, &payload.password)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::Unauthorized)?;

    let lifetime = Duration::days(state.config.session.lifetime_days);
    let session = Session::create(&state.db, user.id, lifetime, client_info(&headers))
        .await
        .map_err(ApiError::Internal)?;

    let jar = jar.add(session_cookie(
        session.id,
        lifetime,
        state.config.session.cookie_secure,
    ));

    info!(user_id = %user.id, "user signed in");
    Ok((jar, Json(user.into())))
}

#[instrument(skip(state, jar))]
async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    // Revocation is idempotent; a missing or garbage cookie still gets the
    // clearing Set-Cookie back.
    if let Some(token) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<Uuid>().ok())
    {
        Session::revoke(&state.db, token)
            .await
            .map_err(ApiError::Internal)?;
    }

    let jar = jar.add(clear_session_cookie(state.config.session.cookie_secure));
    Ok((jar, Json(json!({"success": true}))))
}

#[instrument(skip(state, user, payload))]
async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    credentials::change_password(
        &state.db,
        user.id,
        &payload.current_password,
        &payload.new_password,
    )
    .await
    .map_err(|e| match e {
        ChangePasswordError::CurrentPasswordInvalid => {
            warn!(user_id = %user.id, "password change with wrong current password");
            ApiError::validation("Current password is incorrect")
        }
        ChangePasswordError::TooShort => ApiError::validation("Password too short"),
        ChangePasswordError::Other(e) => ApiError::Internal(e),
    })?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(json!({"success": true})))
}

#[instrument(skip(user))]
async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(session))]
async fn external_session(
    ProviderUser(session): ProviderUser,
) -> Json<crate::auth::provider::ProviderSession> {
    Json(session)
}

#[instrument(skip(state, headers))]
async fn external_sign_out(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    state
        .provider
        .sign_out(token)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({"success": true})))
}

#[cfg(test)]
mod cookie_tests {
    use super::*;

    #[test]
    fn session_cookie_matches_the_contract() {
        let token = Uuid::new_v4();
        let rendered = session_cookie(token, Duration::days(7), false).to_string();

        assert!(rendered.starts_with(&format!("session={token}")));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=604800"));
        assert!(!rendered.contains("Secure"));
    }

    #[test]
    fn session_cookie_is_secure_in_production() {
        let rendered = session_cookie(Uuid::new_v4(), Duration::days(7), true).to_string();
        assert!(rendered.contains("Secure"));
    }

    #[test]
    fn clearing_cookie_zeroes_max_age() {
        let rendered = clear_session_cookie(false).to_string();
        assert!(rendered.starts_with("session="));
        assert!(rendered.contains("Max-Age=0"));
        assert!(rendered.contains("HttpOnly"));
    }
}
