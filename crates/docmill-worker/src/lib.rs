//! Scheduled background work for DocMill.
//!
//! One concern lives here today: sweeping expired files out of the
//! working directories on a cron schedule. The scheduler wrapper keeps
//! registration, startup and shutdown in one place so further periodic
//! jobs slot in beside the sweep.

pub mod jobs;
pub mod scheduler;

pub use scheduler::CronScheduler;
