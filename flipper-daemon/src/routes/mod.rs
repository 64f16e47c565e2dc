//! API route definitions

mod health;
mod snapshots;

use axum::Router;
use serde::Serialize;

use crate::AppState;

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(snapshots::routes())
        .merge(health::routes())
}
