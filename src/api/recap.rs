use axum::{extract::State, response::IntoResponse, Json};

use crate::api::api_error::ApiError;
use crate::api::auth_extractor::AuthUser;
use crate::services::recap;
use crate::AppState;

pub async fn year_recap(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let recap = recap::year_recap(&state.db_pool, claims.sub).await?;
    Ok(Json(recap))
}
