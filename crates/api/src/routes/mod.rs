pub mod content;
pub mod health;
pub mod queue;
pub mod subscribers;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(subscribers::router())
        .merge(content::router())
        .merge(queue::router())
        .with_state(state)
}
