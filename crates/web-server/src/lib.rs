use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use configuration::{ReadinessPolicy, ReadinessSettings, Settings};
use core_types::{Account, Transaction};
use database::{DbError, DbRepository, Readiness, Store};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telemetry::Metrics;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

pub mod error;
pub mod handlers;
pub mod instrument;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub accounts: Arc<dyn Store<Account>>,
    pub transactions: Arc<dyn Store<Transaction>>,
    pub metrics: Arc<Metrics>,
    /// Whether the store has answered a readiness probe.
    pub ready: Arc<AtomicBool>,
}

/// Builds the full route table, wrapped in the metrics middleware.
pub fn app(state: AppState) -> Router {
    let metrics = Arc::clone(&state.metrics);

    Router::new()
        .route(
            "/api/users",
            get(handlers::list::<Account>).post(handlers::create::<Account>),
        )
        .route(
            "/api/users/:id",
            get(handlers::get::<Account>)
                .put(handlers::update::<Account>)
                .delete(handlers::delete::<Account>),
        )
        .route(
            "/api/orders",
            get(handlers::list::<Transaction>).post(handlers::create::<Transaction>),
        )
        .route(
            "/api/orders/:id",
            get(handlers::get::<Transaction>)
                .put(handlers::update::<Transaction>)
                .delete(handlers::delete::<Transaction>),
        )
        .route("/metrics", get(handlers::metrics))
        .route("/health", get(handlers::health))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(middleware::from_fn_with_state(
            metrics,
            instrument::track_metrics,
        ))
}

/// Keeps running `probe` every `interval` until it succeeds, then flips
/// `ready`. Used by the `degrade` readiness policy.
fn spawn_readiness_watch<F, Fut>(
    interval: Duration,
    ready: Arc<AtomicBool>,
    mut probe: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), DbError>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            match probe().await {
                Ok(()) => {
                    ready.store(true, Ordering::Relaxed);
                    tracing::info!("Database became reachable; service is now ready.");
                    return;
                }
                Err(e) => tracing::debug!(error = %e, "Database still unreachable."),
            }
        }
    })
}

/// Applies `settings.on_failure` to the outcome of the startup probe.
///
/// Sets `ready` from the outcome. An error means the server must not start.
/// Under `degrade` the returned handle is the background watch that keeps
/// running `probe` until the store answers.
pub fn apply_readiness_policy<F, Fut>(
    readiness: Readiness,
    settings: &ReadinessSettings,
    ready: &Arc<AtomicBool>,
    probe: F,
) -> anyhow::Result<Option<JoinHandle<()>>>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), DbError>> + Send + 'static,
{
    ready.store(readiness.is_ready(), Ordering::Relaxed);
    let Readiness::Unreachable { attempts, last_error } = readiness else {
        return Ok(None);
    };

    match settings.on_failure {
        ReadinessPolicy::Fail => {
            anyhow::bail!("database unreachable after {attempts} attempts: {last_error}");
        }
        ReadinessPolicy::Continue => {
            tracing::warn!("Serving without a reachable database.");
            Ok(None)
        }
        ReadinessPolicy::Degrade => {
            tracing::warn!("Serving in degraded mode; /health reports not ready.");
            Ok(Some(spawn_readiness_watch(
                settings.interval(),
                Arc::clone(ready),
                probe,
            )))
        }
    }
}

/// The main function to configure and run the web server.
///
/// Opening the pool or binding the listener failing is fatal. An unreachable
/// store is handled according to `settings.readiness.on_failure`.
pub async fn run_server(settings: Settings, metrics: Arc<Metrics>) -> anyhow::Result<()> {
    let pool = database::connect(&settings.database).context("Failed to open the database pool")?;

    let readiness = {
        let pool = &pool;
        let timeout = settings.readiness.attempt_timeout();
        database::wait_until_ready(&settings.readiness, move || database::ping(pool, timeout)).await
    };

    let ready = Arc::new(AtomicBool::new(false));
    let watch_pool = pool.clone();
    let timeout = settings.readiness.attempt_timeout();
    apply_readiness_policy(readiness, &settings.readiness, &ready, move || {
        let pool = watch_pool.clone();
        async move { database::ping(&pool, timeout).await }
    })?;

    let repository = Arc::new(DbRepository::new(pool, Arc::clone(&metrics)));
    let app_state = AppState {
        accounts: repository.clone(),
        transactions: repository,
        metrics,
        ready,
    };
    let app = app(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.server.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.listen_addr))?;
    tracing::info!("Web server started and listening on {}", settings.server.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Web server stopped.");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received.");
}
