use chrono::{Datelike, Utc};
use sqlx::SqlitePool;

use crate::api::api_error::ApiError;
use crate::db::goals as goals_db;
use crate::db::library as library_db;
use crate::models::goal::year_window;
use crate::models::recap::YearRecap;
use crate::services::goals;

const TOP_GENRES: i64 = 5;
const TOP_RATED: i64 = 4;

/// End-of-year summary. Read-only: composes entries and goals, mutates
/// nothing.
pub async fn year_recap(pool: &SqlitePool, user_id: i64) -> Result<YearRecap, ApiError> {
    let now = Utc::now();
    let (year_start, year_end) = year_window(now.year())?;
    let (prev_start, prev_end) = year_window(now.year() - 1)?;

    let mut conn = pool.acquire().await?;

    // This year's finished goals, then last year's annual goal(s) so the
    // recap can show both side by side.
    let mut annual_goals = goals::list_finished_this_year(&mut conn, user_id, now).await?;
    let previous =
        goals_db::annual_goals_in_window(&mut conn, user_id, prev_start, prev_end).await?;
    annual_goals.extend(previous);

    let (total_books_read, total_pages_read) =
        library_db::totals_finished_in_window(&mut conn, user_id, year_start, year_end).await?;
    let most_read_genres =
        library_db::top_genres(&mut conn, user_id, year_start, year_end, TOP_GENRES).await?;
    let top_rated_books =
        library_db::top_rated_books(&mut conn, user_id, year_start, year_end, TOP_RATED).await?;

    Ok(YearRecap {
        annual_goals,
        total_books_read,
        total_pages_read,
        most_read_genres,
        top_rated_books,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::goal::GoalCreate;
    use crate::services::{goals as goal_svc, reading, UserLocks};
    use crate::testutil::{seed_book, seed_user, test_pool};

    async fn finish_and_rate(
        pool: &SqlitePool,
        locks: &UserLocks,
        user: i64,
        book: i64,
        rating: f64,
    ) {
        reading::add_to_library(pool, locks, user, book).await.unwrap();
        reading::set_status(pool, locks, user, book, 2).await.unwrap();
        reading::rate(pool, locks, user, book, rating).await.unwrap();
    }

    #[tokio::test]
    async fn recap_totals_and_rankings() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "ana").await;

        let dune = seed_book(&pool, "Dune", 412, &["sci-fi", "classic"]).await;
        let solaris = seed_book(&pool, "Solaris", 204, &["sci-fi"]).await;
        let emma = seed_book(&pool, "Emma", 300, &["romance"]).await;

        finish_and_rate(&pool, &locks, user, dune, 5.0).await;
        finish_and_rate(&pool, &locks, user, solaris, 4.0).await;
        finish_and_rate(&pool, &locks, user, emma, 4.5).await;

        // A book still in progress must not show up anywhere.
        let pending = seed_book(&pool, "Anathem", 937, &["sci-fi"]).await;
        reading::add_to_library(&pool, &locks, user, pending).await.unwrap();
        reading::set_status(&pool, &locks, user, pending, 1).await.unwrap();

        let recap = year_recap(&pool, user).await.unwrap();

        assert_eq!(recap.total_books_read, 3);
        assert_eq!(recap.total_pages_read, 412 + 204 + 300);

        assert_eq!(recap.most_read_genres[0].genre, "sci-fi");
        assert_eq!(recap.most_read_genres[0].count, 2);

        let titles: Vec<&str> =
            recap.top_rated_books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma", "Solaris"]);
        assert_eq!(recap.top_rated_books[0].rating, 5.0);
        assert!(recap.top_rated_books[0].date_finish.is_some());
    }

    #[tokio::test]
    async fn recap_concatenates_previous_years_annual_goals() {
        let pool = test_pool().await;
        let locks = UserLocks::default();
        let user = seed_user(&pool, "bo").await;
        let book = seed_book(&pool, "Ubik", 224, &[]).await;

        // Met goal this year.
        goal_svc::create_goal(
            &pool,
            &locks,
            user,
            &GoalCreate { goal_type: "books".into(), duration: "monthly".into(), amount: 1 },
        )
        .await
        .unwrap();
        reading::add_to_library(&pool, &locks, user, book).await.unwrap();
        reading::set_status(&pool, &locks, user, book, 2).await.unwrap();

        // Last year's annual goal, inserted with its historical window.
        let (prev_start, prev_end) = year_window(chrono::Utc::now().year() - 1).unwrap();
        let mut conn = pool.acquire().await.unwrap();
        goals_db::insert_goal(&mut conn, user, "books", "annual", 30, prev_start, prev_end)
            .await
            .unwrap();
        // Release the single pooled connection before year_recap acquires it.
        drop(conn);

        let recap = year_recap(&pool, user).await.unwrap();
        assert_eq!(recap.annual_goals.len(), 2);

        let durations: Vec<&str> =
            recap.annual_goals.iter().map(|g| g.duration.as_str()).collect();
        assert!(durations.contains(&"monthly"));
        assert!(durations.contains(&"annual"));
    }

    #[tokio::test]
    async fn recap_is_empty_for_a_quiet_year() {
        let pool = test_pool().await;
        let user = seed_user(&pool, "cy").await;

        let recap = year_recap(&pool, user).await.unwrap();
        assert!(recap.annual_goals.is_empty());
        assert_eq!(recap.total_books_read, 0);
        assert_eq!(recap.total_pages_read, 0);
        assert!(recap.most_read_genres.is_empty());
        assert!(recap.top_rated_books.is_empty());
    }
}
