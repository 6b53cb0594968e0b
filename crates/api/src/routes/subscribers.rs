//! Subscribe / unsubscribe routes, called by the signup form integration.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use postbell_common::error::AppError;
use postbell_common::types::Subscriber;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/subscribers", post(subscribe))
        .route("/api/subscribers/unsubscribe", post(unsubscribe))
}

/// POST /api/subscribers: Subscribe or re-activate an address.
async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<Subscriber>, AppError> {
    let subscriber = state.subscriptions.subscribe(&req.email).await?;
    Ok(Json(subscriber))
}

/// POST /api/subscribers/unsubscribe: Deactivate an address. Unknown addresses are not an error.
async fn unsubscribe(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let known = state.subscriptions.unsubscribe(&req.email).await?;
    Ok(Json(json!({
        "email": req.email.trim().to_lowercase(),
        "active": false,
        "known": known,
    })))
}
