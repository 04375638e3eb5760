//! In-memory counter store.
//!
//! Counters live in a [`DashMap`] with a per-entry expiry deadline. This
//! backend is process-local: it is the right choice for a single-instance
//! deployment and for tests, but quotas are not shared across instances.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use docmill_core::result::AppResult;
use docmill_core::traits::counter::CounterStore;

/// Expired entries are swept opportunistically once the map grows past
/// this size.
const PURGE_THRESHOLD: usize = 4096;

/// A counter value with its expiry deadline.
#[derive(Debug)]
struct CounterEntry {
    value: i64,
    expires_at: Instant,
}

/// In-memory counter store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    counters: DashMap<String, CounterEntry>,
}

impl MemoryCounterStore {
    /// Create an empty counter store.
    pub fn new() -> Self {
        Self {
            counters: DashMap::new(),
        }
    }

    /// Drop every entry whose deadline has passed.
    fn purge_expired(&self) {
        let now = Instant::now();
        self.counters.retain(|_, entry| entry.expires_at > now);
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr(&self, key: &str, ttl: Duration) -> AppResult<i64> {
        let now = Instant::now();
        let value = {
            // The entry guard holds the shard lock, so reset-and-increment
            // is atomic with respect to concurrent callers.
            let mut entry = self
                .counters
                .entry(key.to_string())
                .or_insert_with(|| CounterEntry {
                    value: 0,
                    expires_at: now + ttl,
                });
            if entry.expires_at <= now {
                entry.value = 0;
                entry.expires_at = now + ttl;
            }
            entry.value += 1;
            entry.value
        };

        if self.counters.len() >= PURGE_THRESHOLD {
            self.purge_expired();
        }

        Ok(value)
    }

    async fn get(&self, key: &str) -> AppResult<Option<i64>> {
        match self.counters.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value)),
            _ => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.counters.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
