use sqlx::{Pool, Sqlite};

use crate::api::api_error::ApiError;
use crate::models::user::User;

pub async fn create_user(
    db: &Pool<Sqlite>,
    username: &str,
    is_admin: bool,
    password_hash: &str,
    salt: &str,
) -> Result<User, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, is_admin, password_hash, salt)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id, username, password_hash, salt, is_admin
        "#,
    )
    .bind(username)
    .bind(is_admin)
    .bind(password_hash)
    .bind(salt)
    .fetch_one(db)
    .await?;

    Ok(user)
}

pub async fn get_user_by_username(
    db: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, salt, is_admin
        FROM users
        WHERE username = ?1
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await?;

    Ok(user)
}

pub async fn admin_exists(db: &Pool<Sqlite>) -> Result<i64, ApiError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_admin = 1")
        .fetch_one(db)
        .await?;

    Ok(count)
}
