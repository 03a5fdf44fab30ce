use crate::state::AppState;
use axum::Router;

pub mod credentials;
pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod provider;
pub mod sessions;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
        .merge(handlers::external_routes())
}
