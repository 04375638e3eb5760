//! # docmill-cache
//!
//! Expiring-counter backends for DocMill usage accounting. Two backends
//! are supported:
//!
//! - **memory**: in-process counters backed by [dashmap](https://crates.io/crates/dashmap)
//! - **redis**: shared counters using the [redis](https://crates.io/crates/redis) crate
//!
//! The backend is selected at runtime based on configuration, so a
//! deployment can start on in-process counters and switch to Redis when
//! it grows a second instance.

pub mod keys;
pub mod manager;
#[cfg(feature = "memory")]
pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis_store;

pub use manager::CounterManager;
