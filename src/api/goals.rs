use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::api::api_error::ApiError;
use crate::api::auth_extractor::AuthUser;
use crate::models::goal::GoalCreate;
use crate::services::goals;
use crate::AppState;

pub async fn create_goal(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<GoalCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let goal = goals::create_goal(&state.db_pool, &state.locks, claims.sub, &payload).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(goal_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    goals::delete_goal(&state.db_pool, &state.locks, claims.sub, goal_id).await?;
    Ok(StatusCode::OK)
}

pub async fn list_in_progress(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let goals = goals::list_in_progress(&state.db_pool, claims.sub).await?;
    Ok(Json(goals))
}

pub async fn list_finished(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let goals = goals::list_finished(&state.db_pool, claims.sub).await?;
    Ok(Json(goals))
}
