use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::api::api_error::ApiError;
use crate::db::goals as goals_db;
use crate::db::library as library_db;
use crate::models::goal::{year_window, Goal, GoalCreate, GoalDuration, GoalType};
use crate::services::UserLocks;

/// Recompute every unfinished goal of the user from the library itself.
///
/// Runs on the caller's open transaction, after the triggering entry
/// mutation; if it errors the whole operation rolls back. Recomputation from
/// source data (rather than incremental deltas) makes repeated syncs
/// idempotent and self-heals after entry removals.
pub async fn sync_user_goals(
    db: &mut SqliteConnection,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<(), ApiError> {
    let now_ts = now.timestamp();
    let goals = goals_db::list_unfinished(db, user_id, now_ts).await?;

    for goal in goals {
        let recomputed = match GoalType::resolve(&goal.goal_type)? {
            GoalType::Books => {
                library_db::count_finished_in_window(db, user_id, goal.date_start, goal.date_finish)
                    .await?
            }
            GoalType::Pages => {
                library_db::pages_read_in_window(db, user_id, goal.date_start, goal.date_finish)
                    .await?
            }
        };

        if recomputed != goal.current_amount {
            tracing::debug!(
                goal_id = goal.id,
                user_id,
                from = goal.current_amount,
                to = recomputed,
                "goal amount recomputed"
            );
            goals_db::update_current_amount(db, goal.id, recomputed).await?;
        }
    }

    Ok(())
}

pub async fn create_goal(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    req: &GoalCreate,
) -> Result<Goal, ApiError> {
    let goal_type = GoalType::resolve(&req.goal_type)?;
    let duration = GoalDuration::resolve(&req.duration)?;
    if req.amount <= 0 {
        return Err(ApiError::Validation("goal amount must be positive".into()));
    }

    let _guard = locks.lock_user(user_id).await;
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let duplicate = goals_db::has_unfinished(
        &mut tx,
        user_id,
        goal_type.as_str(),
        duration.as_str(),
        now.timestamp(),
    )
    .await?;
    if duplicate {
        return Err(ApiError::Conflict("repeated goal".into()));
    }

    let (date_start, date_finish) = duration.window(now)?;
    let goal = goals_db::insert_goal(
        &mut tx,
        user_id,
        goal_type.as_str(),
        duration.as_str(),
        req.amount,
        date_start,
        date_finish,
    )
    .await?;

    // Seed pass: a goal created mid-period picks up activity already logged.
    sync_user_goals(&mut tx, user_id, now).await?;
    let goal = goals_db::get_goal(&mut tx, goal.id)
        .await?
        .ok_or_else(|| ApiError::Internal("goal missing right after insert".into()))?;

    tx.commit().await?;

    tracing::info!(user_id, goal_id = goal.id, "goal created");
    Ok(goal)
}

pub async fn delete_goal(
    pool: &SqlitePool,
    locks: &UserLocks,
    user_id: i64,
    goal_id: i64,
) -> Result<(), ApiError> {
    let _guard = locks.lock_user(user_id).await;
    let mut tx = pool.begin().await?;

    let goal = goals_db::get_goal(&mut tx, goal_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("goal {goal_id} not found")))?;
    if goal.user_id != user_id {
        return Err(ApiError::AccessDenied("goal belongs to another user".into()));
    }

    goals_db::delete_goal(&mut tx, goal_id).await?;
    tx.commit().await?;

    Ok(())
}

pub async fn list_in_progress(pool: &SqlitePool, user_id: i64) -> Result<Vec<Goal>, ApiError> {
    let now_ts = Utc::now().timestamp();
    let mut conn = pool.acquire().await?;
    let mut goals = goals_db::get_by_user(&mut conn, user_id).await?;
    goals.retain(|g| !g.is_finished(now_ts));
    Ok(goals)
}

pub async fn list_finished(pool: &SqlitePool, user_id: i64) -> Result<Vec<Goal>, ApiError> {
    let now_ts = Utc::now().timestamp();
    let mut conn = pool.acquire().await?;
    let mut goals = goals_db::get_by_user(&mut conn, user_id).await?;
    goals.retain(|g| g.is_finished(now_ts));
    Ok(goals)
}

/// Finished goals whose window closed inside the current calendar year.
pub async fn list_finished_this_year(
    db: &mut SqliteConnection,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Goal>, ApiError> {
    use chrono::Datelike;

    let now_ts = now.timestamp();
    let (year_start, year_end) = year_window(now.year())?;
    let mut goals = goals_db::get_by_user(db, user_id).await?;
    goals.retain(|g| {
        g.is_finished(now_ts) && g.date_finish >= year_start && g.date_finish <= year_end
    });
    Ok(goals)
}
