//! # docmill-convert
//!
//! The conversion engine: one strategy per supported transformation, a
//! dispatcher that routes requests and bounds concurrency, and the
//! external-tool plumbing the strategies use to shell out to Ghostscript,
//! qpdf, Tesseract, and pdftoppm.
//!
//! ## Layout
//!
//! - [`strategy`] - the [`ConversionStrategy`] trait and the request type
//! - [`dispatcher`] - routing, concurrency limits, scratch-dir isolation
//! - [`strategies`] - the twelve conversions in the matrix
//! - [`tool`] - child-process execution and binary availability probing
//! - [`pdf`], [`office`], [`bundle`] - shared document and packaging helpers

pub mod bundle;
pub mod dispatcher;
pub mod office;
pub mod pages;
pub mod pdf;
pub mod strategies;
pub mod strategy;
pub mod tool;

#[cfg(test)]
pub(crate) mod testutil;

pub use dispatcher::Dispatcher;
pub use strategy::{ConversionStrategy, ConvertRequest};
