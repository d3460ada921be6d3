//! API route handlers
//!
//! - `health`: liveness
//! - `sessions`: create, read, message and clear chat sessions

pub mod health;
pub mod sessions;

use crate::error::ServerError;
use axum::response::Html;

static INDEX_HTML: &str = include_str!("../../static/index.html");

/// The chat page
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
