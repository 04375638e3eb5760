//! Route definitions for the DocMill HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and threads it through every handler via Axum's `State` extractor.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the route table with the request body cap applied.
pub fn build_router(state: AppState) -> Router {
    let max_upload = state.config.storage.max_upload_size_bytes as usize;

    let api_routes = Router::new()
        .merge(convert_routes())
        .merge(usage_routes())
        .merge(maintenance_routes())
        .merge(health_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

/// Conversion endpoints: submit a job, fetch the artifact
fn convert_routes() -> Router<AppState> {
    Router::new()
        .route("/convert", post(handlers::convert::convert))
        .route("/download/{name}", get(handlers::download::download))
}

/// Usage endpoints: quota snapshot
fn usage_routes() -> Router<AppState> {
    Router::new().route("/usage", get(handlers::usage::usage))
}

/// Maintenance endpoints: expiry sweep trigger
fn maintenance_routes() -> Router<AppState> {
    Router::new().route("/cleanup", get(handlers::cleanup::cleanup))
}

/// Health endpoints: liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
