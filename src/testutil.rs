use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::db::catalog;
use crate::models::book::BookCreate;

/// Fresh in-memory database with migrations applied. One connection, so the
/// whole test sees the same memory store.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("in-memory url")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("connect in-memory db");

    sqlx::migrate!().run(&pool).await.expect("migrations");
    pool
}

/// File-backed database with a real connection pool, for tests that need
/// genuinely concurrent connections (the shared in-memory store above is a
/// single connection and would serialize everything at the pool). The temp
/// file handle must stay alive for the duration of the test.
pub async fn test_pool_concurrent() -> (SqlitePool, tempfile::NamedTempFile) {
    let file = tempfile::NamedTempFile::new().expect("temp db file");
    let options = SqliteConnectOptions::new()
        .filename(file.path())
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("connect file db");

    sqlx::migrate!().run(&pool).await.expect("migrations");
    (pool, file)
}

pub async fn seed_user(pool: &SqlitePool, username: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password_hash, salt) VALUES (?1, 'x', 'x') RETURNING id",
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .expect("seed user")
}

pub async fn seed_book(pool: &SqlitePool, title: &str, page_count: i64, genres: &[&str]) -> i64 {
    let mut conn = pool.acquire().await.expect("acquire");
    let book = catalog::insert_book(
        &mut conn,
        &BookCreate {
            title: title.to_string(),
            author: "Test Author".to_string(),
            page_count,
            genres: genres.iter().map(|g| g.to_string()).collect(),
        },
    )
    .await
    .expect("seed book");
    book.id
}
