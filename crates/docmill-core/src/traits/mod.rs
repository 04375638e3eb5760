//! Core traits defined in `docmill-core` and implemented by other crates.

pub mod counter;
pub mod progress;

pub use counter::CounterStore;
pub use progress::{NoopProgress, ProgressSink};
