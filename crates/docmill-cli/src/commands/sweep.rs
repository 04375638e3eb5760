//! One-shot expiry sweep of the working directories.

use anyhow::Context;
use clap::Args;

use docmill_storage::Sweeper;

use crate::output::{self, OutputFormat};

/// Arguments for the sweep command
#[derive(Debug, Args)]
pub struct SweepArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the sweep command
pub async fn execute(args: &SweepArgs, env: &str, format: OutputFormat) -> anyhow::Result<()> {
    let config = super::load_config(env)?;

    if !args.yes {
        let confirm = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete files older than {} hour(s) from '{}' and '{}'?",
                config.storage.expiry_hours, config.storage.upload_dir, config.storage.temp_dir
            ))
            .default(false)
            .interact()
            .context("Input error")?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = Sweeper::new(&config.storage).sweep().await;

    match format {
        OutputFormat::Json => output::print_item(&report, format),
        OutputFormat::Table => {
            output::print_success(&format!(
                "Sweep complete: {} file(s) deleted",
                report.deleted_count
            ));
            for name in &report.deleted_files {
                output::print_kv("deleted", name);
            }
            for error in &report.errors {
                output::print_warning(error);
            }
        }
    }

    Ok(())
}
