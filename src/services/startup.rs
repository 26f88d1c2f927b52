use crate::api::api_error::ApiError;
use crate::db::user::{admin_exists, create_user};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sqlx::SqlitePool;
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, prelude::*};

pub fn init_logging() {
    let file_appender = rolling::daily("logs", "shelfmark.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);

    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_filter = EnvFilter::new("info");

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .json()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(non_blocking_file)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    std::mem::forget(_guard);
}

pub async fn ensure_admin_user(db: &SqlitePool) -> Result<(), ApiError> {
    if admin_exists(db).await? == 0 {
        let argon2 = Argon2::default();
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = argon2
            .hash_password(b"admin", &salt)
            .map_err(|e| ApiError::Internal(format!("password hash failed: {e}")))?
            .to_string();

        create_user(db, "admin", true, &password_hash, salt.as_str()).await?;
        info!("Admin user created: username='admin'");
    }

    Ok(())
}

pub async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::warn!("shutdown signal received");
}
