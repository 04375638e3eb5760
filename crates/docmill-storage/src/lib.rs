//! # docmill-storage
//!
//! Filesystem layer for DocMill: the upload/temp working directories,
//! MIME tables for the formats the converter handles, and the expiry
//! sweeper that keeps both directories from accumulating stale files.

pub mod manager;
pub mod mime;
pub mod sweeper;

pub use manager::StorageManager;
pub use sweeper::{SweepReport, Sweeper};
