//! Notification queue inspection and manual control.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use postbell_common::error::AppError;
use postbell_common::types::{ArticleId, PendingNotification};

use crate::middleware::auth::AdminKey;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/queue", get(list_pending))
        .route(
            "/api/queue/{article_id}",
            get(get_pending).delete(cancel_pending),
        )
        .route("/api/queue/{article_id}/flush", post(flush_pending))
}

/// GET /api/queue: All armed notifications, soonest first.
async fn list_pending(
    State(state): State<AppState>,
    _admin: AdminKey,
) -> Json<Vec<PendingNotification>> {
    Json(state.scheduler.pending_all())
}

/// GET /api/queue/:article_id: The article's armed notification.
async fn get_pending(
    State(state): State<AppState>,
    _admin: AdminKey,
    Path(article_id): Path<i64>,
) -> Result<Json<PendingNotification>, AppError> {
    let article_id = ArticleId(article_id);
    state
        .scheduler
        .pending(article_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No notification scheduled for article {}", article_id)))
}

/// POST /api/queue/:article_id/flush: Send the armed notification now.
async fn flush_pending(
    State(state): State<AppState>,
    _admin: AdminKey,
    Path(article_id): Path<i64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let article_id = ArticleId(article_id);
    if !state.scheduler.flush(article_id) {
        return Err(AppError::NotFound(format!(
            "No notification scheduled for article {}",
            article_id
        )));
    }

    tracing::info!(article_id = %article_id, "Notification flushed by admin");
    Ok(Json(json!({ "article_id": article_id, "flushed": true })))
}

/// DELETE /api/queue/:article_id: Drop the armed notification without sending.
async fn cancel_pending(
    State(state): State<AppState>,
    _admin: AdminKey,
    Path(article_id): Path<i64>,
) -> Json<serde_json::Value> {
    let article_id = ArticleId(article_id);
    let cancelled = state.scheduler.cancel(article_id);
    Json(json!({ "article_id": article_id, "cancelled": cancelled }))
}
