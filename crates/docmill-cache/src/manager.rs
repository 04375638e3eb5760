//! Counter manager that dispatches to the configured backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use docmill_core::config::gate::GateConfig;
use docmill_core::error::AppError;
use docmill_core::result::AppResult;
use docmill_core::traits::counter::CounterStore;

/// Counter manager that wraps the configured counter store.
///
/// The backend is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CounterManager {
    /// The inner counter store.
    inner: Arc<dyn CounterStore>,
}

impl CounterManager {
    /// Create a new counter manager from configuration.
    pub async fn new(config: &GateConfig) -> AppResult<Self> {
        let inner: Arc<dyn CounterStore> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis counter store");
                let store = crate::redis_store::RedisCounterStore::connect(&config.redis).await?;
                Arc::new(store)
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory counter store");
                Arc::new(crate::memory::MemoryCounterStore::new())
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown counter provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a counter manager from an existing store (for testing).
    pub fn from_store(store: Arc<dyn CounterStore>) -> Self {
        Self { inner: store }
    }

    /// Get a reference to the inner store.
    pub fn store(&self) -> &dyn CounterStore {
        self.inner.as_ref()
    }
}

#[async_trait]
impl CounterStore for CounterManager {
    async fn incr(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        self.inner.incr(key, ttl).await
    }

    async fn get(&self, key: &str) -> AppResult<Option<i64>> {
        self.inner.get(key).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.inner.remove(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
