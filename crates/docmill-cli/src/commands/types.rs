//! List the supported conversion matrix.

use serde::Serialize;
use tabled::Tabled;

use docmill_convert::Dispatcher;

use crate::output::{self, OutputFormat};

/// Conversion display row for table output
#[derive(Debug, Serialize, Tabled)]
struct TypeRow {
    /// Wire name
    name: String,
    /// Input files taken
    inputs: String,
    /// Preferred external tool
    tool: String,
}

/// Execute the types command
pub fn execute(env: &str, format: OutputFormat) -> anyhow::Result<()> {
    let config = super::load_config(env)?;
    let dispatcher = Dispatcher::new(&config.convert);

    let rows: Vec<TypeRow> = dispatcher
        .conversions()
        .into_iter()
        .map(|conversion| {
            let tool = dispatcher
                .strategy(conversion)
                .and_then(|s| s.tool())
                .unwrap_or("built-in")
                .to_string();
            TypeRow {
                name: conversion.to_string(),
                inputs: if conversion.is_multi_input() { "2+" } else { "1" }.to_string(),
                tool,
            }
        })
        .collect();

    output::print_list(&rows, format);

    Ok(())
}
