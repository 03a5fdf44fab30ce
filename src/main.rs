mod app;
mod auth;
mod authz;
mod bookmarks;
mod chapters;
mod config;
mod error;
mod scenes;
mod setups;
mod state;
mod stories;
mod users;

use crate::auth::sessions::Session;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "aquila=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    // Hourly sweep of expired session rows. Hygiene only; resolve() already
    // treats expired rows as absent.
    let sweep_db = app_state.db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match Session::sweep_expired(&sweep_db).await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(swept = n, "expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });

    let app = app::build_app(app_state);
    app::serve(app).await
}
