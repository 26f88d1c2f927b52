use sqlx::SqliteConnection;

use crate::api::api_error::ApiError;
use crate::models::library::LibraryEntry;
use crate::models::recap::{GenreCount, RecapBook};

const ENTRY_COLUMNS: &str = "id, user_id, book_id, status, progress, progress_kind, \
     progress_updated_at, rating, review, date_start, date_finish";

pub async fn get_entry(
    db: &mut SqliteConnection,
    user_id: i64,
    book_id: i64,
) -> Result<Option<LibraryEntry>, ApiError> {
    let entry = sqlx::query_as::<_, LibraryEntry>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM library_entries WHERE user_id = ?1 AND book_id = ?2"
    ))
    .bind(user_id)
    .bind(book_id)
    .fetch_optional(db)
    .await?;

    Ok(entry)
}

pub async fn insert_entry(
    db: &mut SqliteConnection,
    user_id: i64,
    book_id: i64,
) -> Result<LibraryEntry, ApiError> {
    let entry = sqlx::query_as::<_, LibraryEntry>(&format!(
        "INSERT INTO library_entries (user_id, book_id) VALUES (?1, ?2) RETURNING {ENTRY_COLUMNS}"
    ))
    .bind(user_id)
    .bind(book_id)
    .fetch_one(db)
    .await?;

    Ok(entry)
}

pub async fn delete_entry(db: &mut SqliteConnection, entry_id: i64) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM library_entries WHERE id = ?1")
        .bind(entry_id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn update_status(
    db: &mut SqliteConnection,
    entry_id: i64,
    status: i64,
    date_start: Option<i64>,
    date_finish: Option<i64>,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE library_entries
        SET status = ?1, date_start = ?2, date_finish = ?3
        WHERE id = ?4
        "#,
    )
    .bind(status)
    .bind(date_start)
    .bind(date_finish)
    .bind(entry_id)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn update_progress(
    db: &mut SqliteConnection,
    entry_id: i64,
    progress: i64,
    progress_kind: &str,
    updated_at: i64,
) -> Result<(), ApiError> {
    sqlx::query(
        r#"
        UPDATE library_entries
        SET progress = ?1, progress_kind = ?2, progress_updated_at = ?3
        WHERE id = ?4
        "#,
    )
    .bind(progress)
    .bind(progress_kind)
    .bind(updated_at)
    .bind(entry_id)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn update_rating(
    db: &mut SqliteConnection,
    entry_id: i64,
    rating: f64,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE library_entries SET rating = ?1 WHERE id = ?2")
        .bind(rating)
        .bind(entry_id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn update_review(
    db: &mut SqliteConnection,
    entry_id: i64,
    review: &str,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE library_entries SET review = ?1 WHERE id = ?2")
        .bind(review)
        .bind(entry_id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn page(
    db: &mut SqliteConnection,
    user_id: i64,
    status: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<LibraryEntry>, ApiError> {
    let entries = match status {
        Some(status) => {
            sqlx::query_as::<_, LibraryEntry>(&format!(
                "SELECT {ENTRY_COLUMNS} FROM library_entries \
                 WHERE user_id = ?1 AND status = ?2 ORDER BY id LIMIT ?3 OFFSET ?4"
            ))
            .bind(user_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, LibraryEntry>(&format!(
                "SELECT {ENTRY_COLUMNS} FROM library_entries \
                 WHERE user_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"
            ))
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(db)
            .await?
        }
    };

    Ok(entries)
}

/// Catalog-wide average over all users' rated entries for one book.
/// Unrated entries (rating = 0) do not weigh in; no ratings yields 0.
pub async fn average_rating(db: &mut SqliteConnection, book_id: i64) -> Result<f64, ApiError> {
    let avg = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(AVG(rating), 0.0) FROM library_entries WHERE book_id = ?1 AND rating > 0",
    )
    .bind(book_id)
    .fetch_one(db)
    .await?;

    Ok(avg)
}

pub async fn count_finished_in_window(
    db: &mut SqliteConnection,
    user_id: i64,
    start: i64,
    end: i64,
) -> Result<i64, ApiError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM library_entries
        WHERE user_id = ?1 AND status = 2
          AND date_finish IS NOT NULL AND date_finish BETWEEN ?2 AND ?3
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await?;

    Ok(count)
}

/// Pages attributable to the window: the full page count for books finished
/// inside it, otherwise the current progress (converted to pages and capped
/// at the book's page count) of books still being read whose last progress
/// update falls inside it. Entries that were never started contribute
/// nothing, whatever their stored progress says.
pub async fn pages_read_in_window(
    db: &mut SqliteConnection,
    user_id: i64,
    start: i64,
    end: i64,
) -> Result<i64, ApiError> {
    let pages = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(
            CASE
                WHEN le.status = 2 AND le.date_finish IS NOT NULL
                     AND le.date_finish BETWEEN ?2 AND ?3
                    THEN b.page_count
                WHEN le.status = 1 AND le.progress_updated_at IS NOT NULL
                     AND le.progress_updated_at BETWEEN ?2 AND ?3
                    THEN MIN(
                        CASE WHEN le.progress_kind = 'pages' THEN le.progress
                             ELSE (le.progress * b.page_count) / 100
                        END,
                        b.page_count)
                ELSE 0
            END), 0)
        FROM library_entries le
        JOIN books b ON b.id = le.book_id
        WHERE le.user_id = ?1
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await?;

    Ok(pages)
}

/// Books and pages finished inside the window, for the year recap.
pub async fn totals_finished_in_window(
    db: &mut SqliteConnection,
    user_id: i64,
    start: i64,
    end: i64,
) -> Result<(i64, i64), ApiError> {
    let totals = sqlx::query_as::<_, (i64, i64)>(
        r#"
        SELECT COUNT(*), COALESCE(SUM(b.page_count), 0)
        FROM library_entries le
        JOIN books b ON b.id = le.book_id
        WHERE le.user_id = ?1 AND le.status = 2
          AND le.date_finish IS NOT NULL AND le.date_finish BETWEEN ?2 AND ?3
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_one(db)
    .await?;

    Ok(totals)
}

pub async fn top_genres(
    db: &mut SqliteConnection,
    user_id: i64,
    start: i64,
    end: i64,
    limit: i64,
) -> Result<Vec<GenreCount>, ApiError> {
    let genres = sqlx::query_as::<_, GenreCount>(
        r#"
        SELECT bg.genre AS genre, COUNT(*) AS count
        FROM library_entries le
        JOIN book_genres bg ON bg.book_id = le.book_id
        WHERE le.user_id = ?1 AND le.status = 2
          AND le.date_finish IS NOT NULL AND le.date_finish BETWEEN ?2 AND ?3
        GROUP BY bg.genre
        ORDER BY count DESC, bg.genre ASC
        LIMIT ?4
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(genres)
}

pub async fn top_rated_books(
    db: &mut SqliteConnection,
    user_id: i64,
    start: i64,
    end: i64,
    limit: i64,
) -> Result<Vec<RecapBook>, ApiError> {
    let books = sqlx::query_as::<_, RecapBook>(
        r#"
        SELECT b.id AS book_id, b.title, b.author,
               le.rating, le.status, le.date_start, le.date_finish
        FROM library_entries le
        JOIN books b ON b.id = le.book_id
        WHERE le.user_id = ?1 AND le.rating > 0 AND le.status = 2
          AND le.date_finish IS NOT NULL AND le.date_finish BETWEEN ?2 AND ?3
        ORDER BY le.rating DESC, b.title ASC
        LIMIT ?4
        "#,
    )
    .bind(user_id)
    .bind(start)
    .bind(end)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(books)
}

pub async fn formats(db: &mut SqliteConnection, entry_id: i64) -> Result<Vec<String>, ApiError> {
    let formats = sqlx::query_scalar::<_, String>(
        "SELECT format FROM entry_formats WHERE entry_id = ?1 ORDER BY format",
    )
    .bind(entry_id)
    .fetch_all(db)
    .await?;

    Ok(formats)
}

pub async fn add_format(
    db: &mut SqliteConnection,
    entry_id: i64,
    format: &str,
) -> Result<(), ApiError> {
    sqlx::query("INSERT OR IGNORE INTO entry_formats (entry_id, format) VALUES (?1, ?2)")
        .bind(entry_id)
        .bind(format)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn remove_format(
    db: &mut SqliteConnection,
    entry_id: i64,
    format: &str,
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM entry_formats WHERE entry_id = ?1 AND format = ?2")
        .bind(entry_id)
        .bind(format)
        .execute(db)
        .await?;

    Ok(())
}
