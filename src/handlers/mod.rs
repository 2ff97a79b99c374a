//! Demo item catalog served behind the monitor.
//!
//! These handlers stand in for the application's own CRUD routes: they are
//! registered through `Monitor::instrument` and know nothing about
//! monitoring themselves.

pub mod items;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

// ─── Client-facing errors ────────────────────────────────────────

/// Expected failures that the handler answers itself. These are ordinary
/// responses as far as the monitor is concerned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

// ─── Internal failures ───────────────────────────────────────────

/// Unexpected failures. Handlers return these as `Err`, and the monitor
/// records them and answers with a generic 500.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot build report for item {id}: no stock history")]
    EmptyHistory { id: String },
    #[error("failed to read request body")]
    Body(#[source] axum::Error),
}
