//! Shared application state for the Axum API server.

use postbell_common::config::AppConfig;
use postbell_engine::scheduler::DebounceScheduler;
use postbell_engine::subscription::SubscriptionService;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub subscriptions: SubscriptionService,
    pub scheduler: DebounceScheduler,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(
        subscriptions: SubscriptionService,
        scheduler: DebounceScheduler,
        config: AppConfig,
    ) -> Self {
        Self {
            subscriptions,
            scheduler,
            config,
        }
    }
}
