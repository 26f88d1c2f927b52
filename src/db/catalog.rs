use sqlx::SqliteConnection;

use crate::api::api_error::ApiError;
use crate::models::book::{Book, BookCreate};

pub async fn insert_book(db: &mut SqliteConnection, book: &BookCreate) -> Result<Book, ApiError> {
    let row = sqlx::query_as::<_, Book>(
        r#"
        INSERT INTO books (title, author, page_count)
        VALUES (?1, ?2, ?3)
        RETURNING id, title, author, page_count
        "#,
    )
    .bind(&book.title)
    .bind(&book.author)
    .bind(book.page_count)
    .fetch_one(&mut *db)
    .await?;

    for genre in &book.genres {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO book_genres (book_id, genre)
            VALUES (?1, ?2)
            "#,
        )
        .bind(row.id)
        .bind(genre)
        .execute(&mut *db)
        .await?;
    }

    Ok(row)
}

pub async fn get_book(db: &mut SqliteConnection, book_id: i64) -> Result<Option<Book>, ApiError> {
    let book = sqlx::query_as::<_, Book>(
        r#"
        SELECT id, title, author, page_count
        FROM books
        WHERE id = ?1
        "#,
    )
    .bind(book_id)
    .fetch_optional(db)
    .await?;

    Ok(book)
}

pub async fn list_books(
    db: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> Result<Vec<Book>, ApiError> {
    let books = sqlx::query_as::<_, Book>(
        r#"
        SELECT id, title, author, page_count
        FROM books
        ORDER BY author, title
        LIMIT ?1 OFFSET ?2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    Ok(books)
}
