use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

/// Route-facing error taxonomy. Every protected route translates its failures
/// through this type so the status/body pairs stay byte-identical across the
/// whole API surface.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, malformed, expired or revoked token. The client is never told
    /// which one.
    #[error("Unauthorized")]
    Unauthorized,

    /// Valid principal, disallowed resource on an identity-keyed route.
    #[error("Forbidden")]
    Forbidden,

    /// Resource absent, or present but owned by someone else on an
    /// existence-sensitive route. Deliberately indistinguishable.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Malformed input: missing field, password too short, bad email.
    #[error("{0}")]
    Validation(String),

    /// Duplicate email on sign-up.
    #[error("{0}")]
    Conflict(String),

    /// Datastore or hashing failure not attributable to caller input.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        Self::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({"error": "Unauthorized"}),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({"error": "Forbidden"})),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                json!({"error": format!("{what} not found")}),
            ),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({"error": msg})),
            ApiError::Internal(e) => {
                // Expected outcomes above are normal traffic; only this arm is
                // an error. The correlation id ties the client response to the
                // log line without leaking the cause.
                let correlation_id = Uuid::new_v4();
                error!(error = %e, %correlation_id, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Internal server error",
                        "correlationId": correlation_id,
                    }),
                )
            }
        };
        if status == StatusCode::UNAUTHORIZED {
            warn!("request rejected: unauthorized");
        }
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn unauthorized_body_is_literal() {
        let (status, body) = body_of(ApiError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn forbidden_body_is_literal() {
        let (status, body) = body_of(ApiError::Forbidden).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({"error": "Forbidden"}));
    }

    #[tokio::test]
    async fn not_found_names_the_resource() {
        let (status, body) = body_of(ApiError::NotFound("Story")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Story not found"}));
    }

    #[tokio::test]
    async fn conflict_maps_to_409() {
        let (status, body) = body_of(ApiError::conflict("Email already registered")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, json!({"error": "Email already registered"}));
    }

    #[tokio::test]
    async fn internal_hides_the_cause_and_carries_a_correlation_id() {
        let (status, body) =
            body_of(ApiError::Internal(anyhow::anyhow!("pool timed out"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
        assert!(body["correlationId"].as_str().unwrap().parse::<Uuid>().is_ok());
        assert!(!body.to_string().contains("pool timed out"));
    }
}
