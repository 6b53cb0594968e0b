//! Postbell API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use postbell_common::config::AppConfig;
use postbell_common::db::{create_pool, run_migrations};
use postbell_engine::articles::PgArticleSource;
use postbell_engine::composer::NotificationComposer;
use postbell_engine::dispatcher::DispatchWorker;
use postbell_engine::scheduler::DebounceScheduler;
use postbell_engine::store::PgSubscriberStore;
use postbell_engine::subscription::SubscriptionService;
use postbell_notifier::SmtpTransport;

use postbell_api::routes::create_router;
use postbell_api::state::AppState;

/// How long in-flight dispatches may keep sending after shutdown.
const DISPATCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting Postbell API server...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Database
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&pool).await?;

    // Collaborators
    let store = Arc::new(PgSubscriberStore::new(pool.clone()));
    let articles = Arc::new(PgArticleSource::new(pool));
    let transport = Arc::new(SmtpTransport::new(&config.smtp)?);

    // Debounce scheduler feeding the dispatch worker
    let (scheduler, fired) = DebounceScheduler::new(config.notify.quiet_period);
    let worker = Arc::new(DispatchWorker::new(
        articles,
        store.clone(),
        transport,
        NotificationComposer::from_config(&config.notify)?,
        config.notify.from_address.clone(),
    ));
    let worker_handle = tokio::spawn(worker.run(fired));

    tracing::info!(
        quiet_period_secs = config.notify.quiet_period.as_secs(),
        from = %config.notify.from_address,
        "Notification engine ready"
    );

    let state = AppState::new(
        SubscriptionService::new(store),
        scheduler.clone(),
        config.clone(),
    );

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    // Armed notifications are volatile; anything still pending is dropped here.
    // Dropping the last scheduler handle closes the fire channel, so the
    // worker finishes the dispatches it already started and returns.
    scheduler.shutdown();
    drop(scheduler);

    match tokio::time::timeout(DISPATCH_DRAIN_TIMEOUT, worker_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Dispatch worker failed"),
        Err(_) => tracing::warn!(
            timeout_secs = DISPATCH_DRAIN_TIMEOUT.as_secs(),
            "In-flight dispatches did not finish in time; their remaining sends are abandoned"
        ),
    }

    tracing::info!("Postbell API server stopped.");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("postbell_api=info,postbell_engine=info,postbell_notifier=info,tower_http=info")
    });

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
