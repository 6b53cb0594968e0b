use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::types::ArticleId;

/// Common error types used across the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected at the subscriber store boundary, never persisted.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// The article was deleted or unpublished before its notification fired.
    #[error("Article {0} is no longer available for notification")]
    ArticleUnavailable(ArticleId),

    /// Delivery to a single recipient failed. Terminal for that attempt.
    #[error("Send to {recipient} failed: {reason}")]
    SendFailure { recipient: String, reason: String },

    /// A timer woke up for a generation that was superseded or cancelled.
    #[error("Stale fire for article {article_id}: generation {generation}, current {current:?}")]
    SchedulingRace {
        article_id: ArticleId,
        generation: u64,
        current: Option<u64>,
    },

    /// Template rendering or other failures with no better home.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::InvalidEmail(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ArticleUnavailable(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::SendFailure { .. } => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::SchedulingRace { .. } => (StatusCode::CONFLICT, self.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
