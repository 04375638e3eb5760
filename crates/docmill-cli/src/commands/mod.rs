//! CLI command definitions and dispatch.

pub mod convert;
pub mod sweep;
pub mod types;
pub mod usage;

use clap::{Parser, Subcommand};

use docmill_core::config::AppConfig;

use crate::output::OutputFormat;

/// DocMill: local document conversion and maintenance
#[derive(Debug, Parser)]
#[command(name = "docmill", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (merges config/default.toml with config/<ENV>.toml)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a conversion through the local pipeline
    Convert(convert::ConvertArgs),
    /// Show the usage quota snapshot for an identity
    Usage(usage::UsageArgs),
    /// Delete expired files from the working directories
    Sweep(sweep::SweepArgs),
    /// List the supported conversion types
    Types,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> anyhow::Result<()> {
        match &self.command {
            Commands::Convert(args) => convert::execute(args, &self.env).await,
            Commands::Usage(args) => usage::execute(args, &self.env, self.format).await,
            Commands::Sweep(args) => sweep::execute(args, &self.env, self.format).await,
            Commands::Types => types::execute(&self.env, self.format),
        }
    }
}

/// Helper: load configuration for the selected environment
pub fn load_config(env: &str) -> anyhow::Result<AppConfig> {
    Ok(AppConfig::load(env)?)
}
