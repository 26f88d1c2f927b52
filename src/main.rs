mod api;
mod config;
mod db;
mod models;
mod services;
#[cfg(test)]
mod testutil;

use crate::config::Config;
use crate::services::startup::{ensure_admin_user, init_logging, shutdown_signal};
use crate::services::UserLocks;
use dotenv::dotenv;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,
    pub locks: UserLocks,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let config = Arc::new(Config::from_env()?);
    let db_pool = db::init_db_pool(&config.database_url).await?;

    ensure_admin_user(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {e}"))?;

    let state = AppState {
        db_pool,
        config: Arc::clone(&config),
        locks: UserLocks::default(),
    };

    let app = axum::Router::new()
        .nest("/api", api::routes().await)
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = TcpListener::bind(format!("{}:{}", &config.host, &config.port)).await?;

    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
