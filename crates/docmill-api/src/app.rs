//! Application builder — wires router + middleware + state into an Axum
//! app, and the server bootstrap that assembles the whole pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use docmill_cache::manager::CounterManager;
use docmill_convert::Dispatcher;
use docmill_core::config::AppConfig;
use docmill_core::error::AppError;
use docmill_gate::{IpThrottle, UsageGate};
use docmill_storage::{StorageManager, Sweeper};
use docmill_worker::CronScheduler;
use docmill_worker::jobs::sweep;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(request_logging))
}

/// Runs the DocMill server with the given configuration.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting DocMill server...");

    // ── Step 1: Working directories ──────────────────────────────
    let storage = Arc::new(StorageManager::new(&config.storage).await?);

    // ── Step 2: Counter store ────────────────────────────────────
    tracing::info!(provider = %config.gate.provider, "Initializing counter store");
    let counters = Arc::new(CounterManager::new(&config.gate).await?);

    // ── Step 3: Admission control ────────────────────────────────
    let gate = UsageGate::new(counters.clone(), config.gate.clone());
    let throttle = IpThrottle::new(counters, &config.gate);

    // ── Step 4: Conversion engine ────────────────────────────────
    let dispatcher = Arc::new(Dispatcher::new(&config.convert));
    tracing::info!(
        conversions = dispatcher.conversions().len(),
        max_concurrent = config.convert.max_concurrent,
        "Conversion dispatcher ready"
    );

    // ── Step 5: Sweeper ──────────────────────────────────────────
    let sweeper = Arc::new(Sweeper::new(&config.storage));

    // ── Step 6: Shutdown channel & scheduled jobs ────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if config.worker.enabled {
        let scheduler = CronScheduler::new().await?;
        sweep::register(&scheduler, Arc::clone(&sweeper), &config.worker.sweep_cron).await?;
        scheduler.start().await?;

        let mut stop = shutdown_rx.clone();
        tokio::spawn(async move {
            if stop.changed().await.is_ok() {
                if let Err(e) = scheduler.shutdown().await {
                    tracing::warn!(error = %e, "Scheduler shutdown failed");
                }
            }
        });
    }

    // ── Step 7: Build and start HTTP server ──────────────────────
    let state = AppState {
        config: Arc::new(config.clone()),
        storage,
        dispatcher,
        gate,
        throttle,
        sweeper,
    };

    let app = build_app(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("DocMill server listening on {addr}");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}

/// Resolves when the process receives ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
