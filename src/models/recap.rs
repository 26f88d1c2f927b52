use serde::Serialize;
use sqlx::FromRow;

use crate::models::goal::Goal;

#[derive(Debug, FromRow, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: i64,
}

/// A top-rated book in the recap, enriched with the caller's own reading
/// record for display.
#[derive(Debug, FromRow, Serialize)]
pub struct RecapBook {
    pub book_id: i64,
    pub title: String,
    pub author: String,
    pub rating: f64,
    pub status: i64,
    pub date_start: Option<i64>,
    pub date_finish: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct YearRecap {
    pub annual_goals: Vec<Goal>,
    pub total_books_read: i64,
    pub total_pages_read: i64,
    pub most_read_genres: Vec<GenreCount>,
    pub top_rated_books: Vec<RecapBook>,
}
