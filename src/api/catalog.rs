use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::api_error::ApiError;
use crate::api::auth_extractor::{AdminUser, AuthUser};
use crate::db::catalog;
use crate::models::book::BookCreate;
use crate::AppState;

pub async fn create_book(
    State(state): State<AppState>,
    AdminUser(_claims): AdminUser,
    Json(payload): Json<BookCreate>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.title.is_empty() || payload.author.is_empty() {
        return Err(ApiError::Validation("Provide both title and author".into()));
    }
    if payload.page_count <= 0 {
        return Err(ApiError::Validation("page count must be positive".into()));
    }

    let mut conn = state.db_pool.acquire().await?;
    let book = catalog::insert_book(&mut conn, &payload).await?;

    Ok((StatusCode::CREATED, Json(book)))
}

#[derive(Debug, Deserialize)]
pub struct CatalogPage {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

pub async fn list_books(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Query(params): Query<CatalogPage>,
) -> Result<impl IntoResponse, ApiError> {
    let size = params.size.unwrap_or(50).clamp(1, 200);
    let offset = params.page.unwrap_or(0).max(0) * size;

    let mut conn = state.db_pool.acquire().await?;
    let books = catalog::list_books(&mut conn, size, offset).await?;

    Ok(Json(json!({
        "count": books.len(),
        "books": books,
    })))
}
