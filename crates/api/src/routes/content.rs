//! Save-event webhook for the host content system.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use postbell_common::types::ContentSaved;
use postbell_engine::hook::SaveDecision;

use crate::middleware::auth::AdminKey;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/content/saved", post(content_saved))
}

/// POST /api/content/saved: Report a save; arms, cancels or ignores.
async fn content_saved(
    State(state): State<AppState>,
    _admin: AdminKey,
    Json(event): Json<ContentSaved>,
) -> Json<SaveDecision> {
    let decision = state.scheduler.on_content_saved(&event);
    tracing::debug!(
        article_id = %event.article_id,
        status = %event.status,
        is_revision = event.is_revision,
        ?decision,
        "Content save received"
    );
    Json(decision)
}
