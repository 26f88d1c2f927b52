use sqlx::SqliteConnection;

use crate::api::api_error::ApiError;
use crate::models::goal::Goal;

const GOAL_COLUMNS: &str =
    "id, user_id, goal_type, duration, amount, current_amount, date_start, date_finish";

pub async fn insert_goal(
    db: &mut SqliteConnection,
    user_id: i64,
    goal_type: &str,
    duration: &str,
    amount: i64,
    date_start: i64,
    date_finish: i64,
) -> Result<Goal, ApiError> {
    let goal = sqlx::query_as::<_, Goal>(&format!(
        "INSERT INTO goals (user_id, goal_type, duration, amount, date_start, date_finish) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING {GOAL_COLUMNS}"
    ))
    .bind(user_id)
    .bind(goal_type)
    .bind(duration)
    .bind(amount)
    .bind(date_start)
    .bind(date_finish)
    .fetch_one(db)
    .await?;

    Ok(goal)
}

pub async fn get_goal(db: &mut SqliteConnection, goal_id: i64) -> Result<Option<Goal>, ApiError> {
    let goal =
        sqlx::query_as::<_, Goal>(&format!("SELECT {GOAL_COLUMNS} FROM goals WHERE id = ?1"))
            .bind(goal_id)
            .fetch_optional(db)
            .await?;

    Ok(goal)
}

pub async fn get_by_user(db: &mut SqliteConnection, user_id: i64) -> Result<Vec<Goal>, ApiError> {
    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals WHERE user_id = ?1 ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(goals)
}

/// Goals still in play: target not met and window not yet past. Only these
/// are touched by synchronization.
pub async fn list_unfinished(
    db: &mut SqliteConnection,
    user_id: i64,
    now_ts: i64,
) -> Result<Vec<Goal>, ApiError> {
    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals \
         WHERE user_id = ?1 AND current_amount < amount AND date_finish >= ?2 ORDER BY id"
    ))
    .bind(user_id)
    .bind(now_ts)
    .fetch_all(db)
    .await?;

    Ok(goals)
}

pub async fn has_unfinished(
    db: &mut SqliteConnection,
    user_id: i64,
    goal_type: &str,
    duration: &str,
    now_ts: i64,
) -> Result<bool, ApiError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM goals
        WHERE user_id = ?1 AND goal_type = ?2 AND duration = ?3
          AND current_amount < amount AND date_finish >= ?4
        "#,
    )
    .bind(user_id)
    .bind(goal_type)
    .bind(duration)
    .bind(now_ts)
    .fetch_one(db)
    .await?;

    Ok(count > 0)
}

pub async fn update_current_amount(
    db: &mut SqliteConnection,
    goal_id: i64,
    current_amount: i64,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE goals SET current_amount = ?1 WHERE id = ?2")
        .bind(current_amount)
        .bind(goal_id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn delete_goal(db: &mut SqliteConnection, goal_id: i64) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM goals WHERE id = ?1")
        .bind(goal_id)
        .execute(db)
        .await?;

    Ok(())
}

/// Annual-duration goals whose window lies inside [start, end]; the recap
/// uses this to surface last year's annual goal next to this year's.
pub async fn annual_goals_in_window(
    db: &mut SqliteConnection,
    user_id: i64,
    start: i64,
    end: i64,
) -> Result<Vec<Goal>, ApiError> {
    let goals = sqlx::query_as::<_, Goal>(&format!(
        "SELECT {GOAL_COLUMNS} FROM goals \
         WHERE user_id = ?1 AND duration = 'annual' \
           AND date_start >= ?2 AND date_finish <= ?3 ORDER BY id"
    ))
    .bind(user_id)
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;

    Ok(goals)
}
