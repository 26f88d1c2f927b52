use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::api::api_error::ApiError;
use crate::api::auth_extractor::AuthUser;
use crate::models::library::{
    FormatTag, ProgressUpdate, RatingUpdate, ReviewUpdate, StatusUpdate,
};
use crate::services::reading;
use crate::AppState;

pub async fn add_to_library(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let entry =
        reading::add_to_library(&state.db_pool, &state.locks, claims.sub, book_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove_from_library(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    reading::remove_from_library(&state.db_pool, &state.locks, claims.sub, book_id).await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
pub struct LibraryPage {
    pub status: Option<i64>,
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub async fn list_library(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Query(params): Query<LibraryPage>,
) -> Result<impl IntoResponse, ApiError> {
    let size = params.size.unwrap_or(50).clamp(1, 200);
    let offset = params.page.unwrap_or(0).max(0) * size;

    let entries =
        reading::list_library(&state.db_pool, claims.sub, params.status, size, offset).await?;
    Ok(Json(entries))
}

pub async fn get_entry(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = reading::get_entry(&state.db_pool, claims.sub, book_id).await?;
    Ok(Json(detail))
}

pub async fn set_status(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
    Json(payload): Json<StatusUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let entry =
        reading::set_status(&state.db_pool, &state.locks, claims.sub, book_id, payload.status)
            .await?;
    Ok(Json(entry))
}

pub async fn set_progress(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
    Json(payload): Json<ProgressUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = reading::set_progress(
        &state.db_pool,
        &state.locks,
        claims.sub,
        book_id,
        payload.amount,
        &payload.kind,
    )
    .await?;
    Ok(Json(entry))
}

pub async fn rate_book(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
    Json(payload): Json<RatingUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let result =
        reading::rate(&state.db_pool, &state.locks, claims.sub, book_id, payload.rating).await?;
    Ok(Json(result))
}

pub async fn review_book(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
    Json(payload): Json<ReviewUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    let entry =
        reading::review(&state.db_pool, &state.locks, claims.sub, book_id, &payload.review)
            .await?;
    Ok(Json(entry))
}

pub async fn add_format(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(book_id): Path<i64>,
    Json(payload): Json<FormatTag>,
) -> Result<impl IntoResponse, ApiError> {
    let formats =
        reading::add_format(&state.db_pool, &state.locks, claims.sub, book_id, &payload.format)
            .await?;
    Ok(Json(formats))
}

pub async fn remove_format(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path((book_id, format)): Path<(i64, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let formats =
        reading::remove_format(&state.db_pool, &state.locks, claims.sub, book_id, &format)
            .await?;
    Ok(Json(formats))
}
