//! Counter store trait for pluggable rate-limit backends.

use std::time::Duration;

use async_trait::async_trait;

use crate::result::AppResult;

/// Trait for expiring-counter backends (Redis or in-memory).
///
/// The usage gate is built entirely on `incr`: increment-then-compare is
/// the atomic admission primitive, so a backend must guarantee that two
/// concurrent `incr` calls on the same key never observe the same value.
#[async_trait]
pub trait CounterStore: Send + Sync + std::fmt::Debug + 'static {
    /// Atomically increment a counter by 1 and return the new value.
    ///
    /// When the increment creates the key, `ttl` is applied to it;
    /// subsequent increments leave the existing expiry untouched.
    async fn incr(&self, key: &str, ttl: Duration) -> AppResult<i64>;

    /// Get the current value. Returns `None` if the key does not exist or
    /// has expired.
    async fn get(&self, key: &str) -> AppResult<Option<i64>>;

    /// Delete a counter.
    async fn remove(&self, key: &str) -> AppResult<()>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
