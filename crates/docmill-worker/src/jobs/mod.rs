//! Scheduled job registrations.

pub mod sweep;
