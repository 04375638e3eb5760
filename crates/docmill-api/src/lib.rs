//! # docmill-api
//!
//! HTTP API layer for DocMill built on Axum.
//!
//! Provides the conversion, download, usage, cleanup, and health
//! endpoints, the identity-resolution extractor, middleware (CORS,
//! request logging), and the mapping from [`AppError`] to HTTP responses.
//!
//! [`AppError`]: docmill_core::error::AppError

pub mod app;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;

pub use app::{build_app, run_server};
pub use state::AppState;
