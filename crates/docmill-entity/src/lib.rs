//! # docmill-entity
//!
//! Domain entity models for Hayashi DocMill: the conversion type matrix,
//! per-conversion option records, job lifecycle types, usage tiers, and
//! caller identity. Every type derives `Debug`, `Clone`, `Serialize`,
//! and `Deserialize`; wire names match the public HTTP contract.

pub mod conversion;
pub mod file;
pub mod identity;
pub mod job;
pub mod options;
pub mod tier;
pub mod usage;

pub use conversion::{ConversionType, ConvertOutcome};
pub use file::{StoredFile, UploadedFile};
pub use identity::Identity;
pub use job::{ConversionJob, JobStatus};
pub use options::ConversionOptions;
pub use tier::Tier;
pub use usage::UsageData;
