//! Core type definitions used across the DocMill workspace.

pub mod id;

pub use id::*;
