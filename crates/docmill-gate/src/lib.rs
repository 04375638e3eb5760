//! # docmill-gate
//!
//! Admission control for the conversion pipeline:
//!
//! - [`UsageGate`] enforces per-identity daily conversion quotas.
//! - [`IpThrottle`] caps requests per IP per hour, regardless of tier.
//!
//! Both are built on the [`CounterStore`] atomic increment, so they hold
//! across server instances when the counters live in Redis.
//!
//! [`CounterStore`]: docmill_core::traits::counter::CounterStore

pub mod gate;
pub mod throttle;

pub use gate::{GateDecision, UsageGate};
pub use throttle::IpThrottle;
