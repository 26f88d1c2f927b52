use chrono::Utc;
use sqlx::SqlitePool;

use crate::api::api_error::ApiError;
use crate::db::catalog;
use crate::db::library as library_db;
use crate::models::book::Book;
use crate::models::library::{
    EntryDetail, LibraryEntry, ProgressKind, RatingResult, ReadingStatus,
};
use crate::services::goals::sync_user_goals;
use crate::services::UserLocks;

pub const REVIEW_MAX_CHARS: usize = 2000;

// Every mutating operation here follows the same shape: take the user's
// lock, open one transaction, validate, mutate the entry, synchronize goals,
// commit. A failure anywhere rolls the whole unit back.

pub async fn add_to_library(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
) -> Result<LibraryEntry, ApiError> {
    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    require_book(&mut tx, book_id).await?;
    if library_db::get_entry(&mut tx, user_id, book_id).await?.is_some() {
        return Err(ApiError::Conflict("book already in library".into()));
    }

    let entry = library_db::insert_entry(&mut tx, user_id, book_id).await?;
    sync_user_goals(&mut tx, user_id, Utc::now()).await?;
    tx.commit().await?;

    tracing::info!(user_id, book_id, "book added to library");
    Ok(entry)
}

/// Goal amounts are not decremented here; the next sync recomputes any
/// still-unfinished goal from what remains.
pub async fn remove_from_library(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
) -> Result<(), ApiError> {
    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    require_book(&mut tx, book_id).await?;
    let entry = require_entry(&mut tx, user_id, book_id).await?;
    library_db::delete_entry(&mut tx, entry.id).await?;
    tx.commit().await?;

    tracing::info!(user_id, book_id, "book removed from library");
    Ok(())
}

pub async fn set_status(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
    status_code: i64,
) -> Result<LibraryEntry, ApiError> {
    let status = ReadingStatus::from_code(status_code)?;

    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    require_book(&mut tx, book_id).await?;
    let mut entry = require_entry(&mut tx, user_id, book_id).await?;

    let now = Utc::now();
    let now_ts = now.timestamp();
    match status {
        ReadingStatus::Reading => {
            if entry.status == ReadingStatus::NotStarted.code() && entry.date_start.is_none() {
                entry.date_start = Some(now_ts);
            }
        }
        ReadingStatus::Finished => {
            if entry.date_finish.is_none() {
                entry.date_finish = Some(now_ts);
            }
        }
        ReadingStatus::NotStarted => {}
    }
    entry.status = status.code();

    library_db::update_status(&mut tx, entry.id, entry.status, entry.date_start, entry.date_finish)
        .await?;
    sync_user_goals(&mut tx, user_id, now).await?;
    tx.commit().await?;

    Ok(entry)
}

pub async fn set_progress(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
    amount: i64,
    kind_name: &str,
) -> Result<LibraryEntry, ApiError> {
    let kind = ProgressKind::parse(kind_name)?;

    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    let book = require_book(&mut tx, book_id).await?;
    let mut entry = require_entry(&mut tx, user_id, book_id).await?;

    let bound = match kind {
        ProgressKind::Percentage => 100,
        ProgressKind::Pages => book.page_count,
    };
    if amount < 0 || amount > bound {
        return Err(ApiError::Validation("invalid progress amount".into()));
    }

    let now = Utc::now();
    entry.progress = amount;
    entry.progress_kind = kind.as_str().to_string();
    entry.progress_updated_at = Some(now.timestamp());

    library_db::update_progress(&mut tx, entry.id, amount, kind.as_str(), now.timestamp()).await?;
    sync_user_goals(&mut tx, user_id, now).await?;
    tx.commit().await?;

    Ok(entry)
}

pub async fn rate(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
    rating: f64,
) -> Result<RatingResult, ApiError> {
    validate_rating(rating)?;

    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    require_book(&mut tx, book_id).await?;
    let mut entry = require_entry(&mut tx, user_id, book_id).await?;
    entry.rating = rating;

    library_db::update_rating(&mut tx, entry.id, rating).await?;
    // Rating never counts toward a goal, but the sync still runs so any
    // pending recomputation is picked up inside this unit of work.
    sync_user_goals(&mut tx, user_id, Utc::now()).await?;
    let average_rating = library_db::average_rating(&mut tx, book_id).await?;
    tx.commit().await?;

    Ok(RatingResult { entry, average_rating })
}

pub async fn review(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
    review: &str,
) -> Result<LibraryEntry, ApiError> {
    if review.chars().count() > REVIEW_MAX_CHARS {
        return Err(ApiError::Validation(format!(
            "review must be at most {REVIEW_MAX_CHARS} characters"
        )));
    }

    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    require_book(&mut tx, book_id).await?;
    let mut entry = require_entry(&mut tx, user_id, book_id).await?;
    entry.review = review.to_string();

    library_db::update_review(&mut tx, entry.id, review).await?;
    sync_user_goals(&mut tx, user_id, Utc::now()).await?;
    tx.commit().await?;

    Ok(entry)
}

pub async fn add_format(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
    format: &str,
) -> Result<Vec<String>, ApiError> {
    if format.is_empty() {
        return Err(ApiError::Validation("format tag must not be empty".into()));
    }

    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    require_book(&mut tx, book_id).await?;
    let entry = require_entry(&mut tx, user_id, book_id).await?;
    library_db::add_format(&mut tx, entry.id, format).await?;
    let formats = library_db::formats(&mut tx, entry.id).await?;
    tx.commit().await?;

    Ok(formats)
}

pub async fn remove_format(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    book_id: i64,
    format: &str,
) -> Result<Vec<String>, ApiError> {
    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    require_book(&mut tx, book_id).await?;
    let entry = require_entry(&mut tx, user_id, book_id).await?;
    library_db::remove_format(&mut tx, entry.id, format).await?;
    let formats = library_db::formats(&mut tx, entry.id).await?;
    tx.commit().await?;

    Ok(formats)
}

pub async fn get_entry(
    pool: &SqlitePool,
    user_id: i64,
    book_id: i64,
) -> Result<EntryDetail, ApiError> {
    let mut conn = pool.acquire().await?;
    require_book(&mut conn, book_id).await?;
    let entry = require_entry(&mut conn, user_id, book_id).await?;
    let formats = library_db::formats(&mut conn, entry.id).await?;
    Ok(EntryDetail { entry, formats })
}

pub async fn list_library(
    pool: &SqlitePool,
    user_id: i64,
    status: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<LibraryEntry>, ApiError> {
    if let Some(code) = status {
        ReadingStatus::from_code(code)?;
    }
    let mut conn = pool.acquire().await?;
    library_db::page(&mut conn, user_id, status, limit, offset).await
}

pub fn validate_rating(rating: f64) -> Result<(), ApiError> {
    let on_half_step = (rating * 2.0).fract() == 0.0;
    let in_range = rating == 0.0 || (0.5..=5.0).contains(&rating);
    if !(on_half_step && in_range) {
        return Err(ApiError::Validation(
            "rating must be 0 or between 0.5 and 5.0 in steps of 0.5".into(),
        ));
    }
    Ok(())
}

async fn require_book(
    db: &mut sqlx::SqliteConnection,
    book_id: i64,
) -> Result<Book, ApiError> {
    catalog::get_book(db, book_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book {book_id} not found")))
}

async fn require_entry(
    db: &mut sqlx::SqliteConnection,
    user_id: i64,
    book_id: i64,
) -> Result<LibraryEntry, ApiError> {
    library_db::get_entry(db, user_id, book_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("book not in library".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_book, seed_user, test_pool};

    #[tokio::test]
    async fn rating_steps_are_enforced() {
        assert!(validate_rating(0.0).is_ok());
        assert!(validate_rating(0.5).is_ok());
        assert!(validate_rating(3.5).is_ok());
        assert!(validate_rating(5.0).is_ok());

        for bad in [56.89, 0.3, 0.25, -0.5, 5.5, 4.1, f64::NAN] {
            let err = validate_rating(bad).unwrap_err();
            match err {
                ApiError::Validation(msg) => assert!(msg.contains("0.5")),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn adding_the_same_book_twice_is_rejected() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "ana").await;
        let book = seed_book(&pool, "Dune", 412, &[]).await;

        add_to_library(&pool, &locks, user, book).await.unwrap();
        let err = add_to_library(&pool, &locks, user, book).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let entries = list_library(&pool, user, None, 50, 0).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn unknown_book_is_not_found() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "bo").await;

        let err = add_to_library(&pool, &locks, user, 999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = set_status(&pool, &locks, user, 999, 1).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn operations_on_a_book_outside_the_library_conflict() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "cy").await;
        let book = seed_book(&pool, "Emma", 300, &[]).await;

        let err = set_status(&pool, &locks, user, book, 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = remove_from_library(&pool, &locks, user, book).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn invalid_status_code_leaves_the_entry_untouched() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "dee").await;
        let book = seed_book(&pool, "Ubik", 224, &[]).await;

        add_to_library(&pool, &locks, user, book).await.unwrap();
        let err = set_status(&pool, &locks, user, book, 100).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let detail = get_entry(&pool, user, book).await.unwrap();
        assert_eq!(detail.entry.status, 0);
        assert!(detail.entry.date_start.is_none());
        assert!(detail.entry.date_finish.is_none());
    }

    #[tokio::test]
    async fn status_transitions_stamp_dates() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "eli").await;
        let book = seed_book(&pool, "Solaris", 204, &[]).await;

        add_to_library(&pool, &locks, user, book).await.unwrap();

        let entry = set_status(&pool, &locks, user, book, 1).await.unwrap();
        assert!(entry.date_start.is_some());
        assert!(entry.date_finish.is_none());

        let entry = set_status(&pool, &locks, user, book, 2).await.unwrap();
        let finished_at = entry.date_finish.expect("finish date set");

        // Finishing again keeps the original finish date.
        let entry = set_status(&pool, &locks, user, book, 2).await.unwrap();
        assert_eq!(entry.date_finish, Some(finished_at));
    }

    #[tokio::test]
    async fn progress_bounds_follow_the_declared_kind() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "fay").await;
        let book = seed_book(&pool, "Piranesi", 200, &[]).await;

        add_to_library(&pool, &locks, user, book).await.unwrap();

        let err = set_progress(&pool, &locks, user, book, 101, "percentage").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = set_progress(&pool, &locks, user, book, 201, "pages").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = set_progress(&pool, &locks, user, book, -1, "pages").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = set_progress(&pool, &locks, user, book, 50, "chapters").await.unwrap_err();
        match err {
            ApiError::Validation(msg) => assert_eq!(msg, "invalid progress type"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let entry = set_progress(&pool, &locks, user, book, 200, "pages").await.unwrap();
        assert_eq!(entry.progress, 200);
        assert_eq!(entry.progress_kind, "pages");
    }

    #[tokio::test]
    async fn rating_returns_the_catalog_average() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let reader_a = seed_user(&pool, "gus").await;
        let reader_b = seed_user(&pool, "hana").await;
        let book = seed_book(&pool, "Middlemarch", 880, &[]).await;

        add_to_library(&pool, &locks, reader_a, book).await.unwrap();
        add_to_library(&pool, &locks, reader_b, book).await.unwrap();

        let result = rate(&pool, &locks, reader_a, book, 4.0).await.unwrap();
        assert_eq!(result.average_rating, 4.0);

        let result = rate(&pool, &locks, reader_b, book, 5.0).await.unwrap();
        assert_eq!(result.entry.rating, 5.0);
        assert_eq!(result.average_rating, 4.5);
    }

    #[tokio::test]
    async fn overlong_review_is_rejected() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "ivo").await;
        let book = seed_book(&pool, "Anathem", 937, &[]).await;

        add_to_library(&pool, &locks, user, book).await.unwrap();

        let too_long = "x".repeat(REVIEW_MAX_CHARS + 1);
        let err = review(&pool, &locks, user, book, &too_long).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let at_limit = "y".repeat(REVIEW_MAX_CHARS);
        let entry = review(&pool, &locks, user, book, &at_limit).await.unwrap();
        assert_eq!(entry.review.chars().count(), REVIEW_MAX_CHARS);
    }

    #[tokio::test]
    async fn formats_are_owned_by_the_entry() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "jun").await;
        let book = seed_book(&pool, "Dune", 412, &[]).await;

        add_to_library(&pool, &locks, user, book).await.unwrap();
        let formats = add_format(&pool, &locks, user, book, "paperback").await.unwrap();
        assert_eq!(formats, vec!["paperback"]);
        let formats = add_format(&pool, &locks, user, book, "ebook").await.unwrap();
        assert_eq!(formats, vec!["ebook", "paperback"]);

        // Re-adding the same tag is a no-op, not a duplicate.
        let formats = add_format(&pool, &locks, user, book, "ebook").await.unwrap();
        assert_eq!(formats.len(), 2);

        let formats = remove_format(&pool, &locks, user, book, "ebook").await.unwrap();
        assert_eq!(formats, vec!["paperback"]);

        // Removing the entry cascades to its formats; re-adding starts clean.
        remove_from_library(&pool, &locks, user, book).await.unwrap();
        add_to_library(&pool, &locks, user, book).await.unwrap();
        let detail = get_entry(&pool, user, book).await.unwrap();
        assert!(detail.formats.is_empty());
    }

    #[tokio::test]
    async fn library_paging_filters_by_status() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "kim").await;

        for (title, finish) in [("A", true), ("B", false), ("C", true)] {
            let book = seed_book(&pool, title, 100, &[]).await;
            add_to_library(&pool, &locks, user, book).await.unwrap();
            if finish {
                set_status(&pool, &locks, user, book, 2).await.unwrap();
            }
        }

        let finished = list_library(&pool, user, Some(2), 50, 0).await.unwrap();
        assert_eq!(finished.len(), 2);
        let all = list_library(&pool, user, None, 50, 0).await.unwrap();
        assert_eq!(all.len(), 3);
        let first_page = list_library(&pool, user, None, 2, 0).await.unwrap();
        assert_eq!(first_page.len(), 2);

        let err = list_library(&pool, user, Some(7), 50, 0).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
