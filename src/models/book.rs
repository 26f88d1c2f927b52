use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub page_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct BookCreate {
    pub title: String,
    pub author: String,
    pub page_count: i64,
    #[serde(default)]
    pub genres: Vec<String>,
}
