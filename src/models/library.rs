use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::api::api_error::ApiError;

/// Where a reader is with a book. Stored as an integer code, set bluntly by
/// the client rather than walked through a guarded workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingStatus {
    NotStarted,
    Reading,
    Finished,
}

impl ReadingStatus {
    pub fn from_code(code: i64) -> Result<Self, ApiError> {
        match code {
            0 => Ok(ReadingStatus::NotStarted),
            1 => Ok(ReadingStatus::Reading),
            2 => Ok(ReadingStatus::Finished),
            other => Err(ApiError::Validation(format!(
                "invalid reading status {other}, expected 0 (not started), 1 (reading) or 2 (finished)"
            ))),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ReadingStatus::NotStarted => 0,
            ReadingStatus::Reading => 1,
            ReadingStatus::Finished => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    Percentage,
    Pages,
}

impl ProgressKind {
    pub fn parse(name: &str) -> Result<Self, ApiError> {
        match name {
            "percentage" => Ok(ProgressKind::Percentage),
            "pages" => Ok(ProgressKind::Pages),
            _ => Err(ApiError::Validation("invalid progress type".into())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressKind::Percentage => "percentage",
            ProgressKind::Pages => "pages",
        }
    }
}

/// A user's per-book reading record. Timestamps are unix epoch seconds.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub status: i64,
    pub progress: i64,
    pub progress_kind: String,
    pub progress_updated_at: Option<i64>,
    pub rating: f64,
    pub review: String,
    pub date_start: Option<i64>,
    pub date_finish: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct EntryDetail {
    #[serde(flatten)]
    pub entry: LibraryEntry,
    pub formats: Vec<String>,
}

/// A rating update echoes the caller's entry together with the book's
/// catalog-wide average over all users' rated entries.
#[derive(Debug, Serialize)]
pub struct RatingResult {
    pub entry: LibraryEntry,
    pub average_rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: i64,
}

#[derive(Debug, Deserialize)]
pub struct ProgressUpdate {
    pub amount: i64,
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct RatingUpdate {
    pub rating: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewUpdate {
    pub review: String,
}

#[derive(Debug, Deserialize)]
pub struct FormatTag {
    pub format: String,
}
