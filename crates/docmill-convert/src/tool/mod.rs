//! External tool plumbing: child-process execution and availability probing.

pub mod executor;
pub mod probe;

pub use executor::{ToolExecutor, ToolRun};
pub use probe::ToolProbe;
