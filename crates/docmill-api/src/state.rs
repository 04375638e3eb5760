//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use docmill_convert::Dispatcher;
use docmill_core::config::AppConfig;
use docmill_gate::{IpThrottle, UsageGate};
use docmill_storage::{StorageManager, Sweeper};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All heavyweight fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Upload and temp working directories.
    pub storage: Arc<StorageManager>,
    /// Conversion strategy dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Daily conversion quota gate.
    pub gate: UsageGate,
    /// Hourly per-IP request throttle.
    pub throttle: IpThrottle,
    /// Expiry sweeper behind the cleanup endpoint.
    pub sweeper: Arc<Sweeper>,
}
