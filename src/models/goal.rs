use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::api::api_error::ApiError;

/// What a goal counts: finished books or pages read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalType {
    Books,
    Pages,
}

impl GoalType {
    /// Resolve a client-supplied name against the closed set. Unknown names
    /// are NotFound, matching the lookup-row semantics of goal kinds.
    pub fn resolve(name: &str) -> Result<Self, ApiError> {
        match name {
            "books" => Ok(GoalType::Books),
            "pages" => Ok(GoalType::Pages),
            _ => Err(ApiError::NotFound(format!("unknown goal type '{name}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GoalType::Books => "books",
            GoalType::Pages => "pages",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalDuration {
    Monthly,
    Annual,
}

impl GoalDuration {
    pub fn resolve(name: &str) -> Result<Self, ApiError> {
        match name {
            "monthly" => Ok(GoalDuration::Monthly),
            "annual" => Ok(GoalDuration::Annual),
            _ => Err(ApiError::NotFound(format!("unknown goal duration '{name}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GoalDuration::Monthly => "monthly",
            GoalDuration::Annual => "annual",
        }
    }

    /// The active window implied by "now": the current calendar month or
    /// year, as inclusive epoch-second bounds.
    pub fn window(self, now: DateTime<Utc>) -> Result<(i64, i64), ApiError> {
        match self {
            GoalDuration::Monthly => month_window(now.year(), now.month()),
            GoalDuration::Annual => year_window(now.year()),
        }
    }
}

pub fn month_window(year: i32, month: u32) -> Result<(i64, i64), ApiError> {
    let start = first_of_month(year, month)?;
    let (next_y, next_m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next = first_of_month(next_y, next_m)?;
    Ok((start, next - 1))
}

pub fn year_window(year: i32) -> Result<(i64, i64), ApiError> {
    let start = first_of_month(year, 1)?;
    let next = first_of_month(year + 1, 1)?;
    Ok((start, next - 1))
}

fn first_of_month(year: i32, month: u32) -> Result<i64, ApiError> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map(|d| d.timestamp())
        .ok_or_else(|| ApiError::Internal(format!("invalid calendar window {year}-{month:02}")))
}

/// A periodic reading target owned by one user. Completion is derived, never
/// stored: a goal is finished once the target is met or its window has passed.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub goal_type: String,
    pub duration: String,
    pub amount: i64,
    pub current_amount: i64,
    pub date_start: i64,
    pub date_finish: i64,
}

impl Goal {
    pub fn is_finished(&self, now_ts: i64) -> bool {
        self.current_amount >= self.amount || now_ts > self.date_finish
    }
}

#[derive(Debug, Deserialize)]
pub struct GoalCreate {
    pub goal_type: String,
    pub duration: String,
    pub amount: i64,
}
