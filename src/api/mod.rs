use axum::{
    routing::{delete, get, post, put},
    Router,
};

pub mod api_error;
mod auth_extractor;
mod catalog;
mod goals;
mod library;
mod recap;
mod user;

use crate::AppState;

pub async fn routes() -> Router<AppState> {
    Router::new()
        // Users
        .route("/users", post(user::create_user))
        .route("/login", post(user::login))
        // Catalog
        .route("/books", post(catalog::create_book).get(catalog::list_books))
        // Library
        .route("/library", get(library::list_library))
        .route(
            "/library/{book_id}",
            post(library::add_to_library)
                .get(library::get_entry)
                .delete(library::remove_from_library),
        )
        .route("/library/{book_id}/status", put(library::set_status))
        .route("/library/{book_id}/progress", put(library::set_progress))
        .route("/library/{book_id}/rating", put(library::rate_book))
        .route("/library/{book_id}/review", put(library::review_book))
        .route("/library/{book_id}/formats", post(library::add_format))
        .route("/library/{book_id}/formats/{format}", delete(library::remove_format))
        // Goals
        .route("/goals", post(goals::create_goal))
        .route("/goals/{goal_id}", delete(goals::delete_goal))
        .route("/goals/in-progress", get(goals::list_in_progress))
        .route("/goals/finished", get(goals::list_finished))
        // Recap
        .route("/recap", get(recap::year_recap))
}
