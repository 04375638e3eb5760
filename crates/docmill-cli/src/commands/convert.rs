//! Run a conversion through the local pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use anyhow::Context;
use clap::Args;

use docmill_convert::{ConvertRequest, Dispatcher};
use docmill_core::traits::progress::ProgressSink;
use docmill_entity::conversion::ConversionType;
use docmill_entity::file::UploadedFile;
use docmill_entity::options::ConversionOptions;
use docmill_storage::StorageManager;

use crate::controller::JobController;
use crate::output;

/// Arguments for the convert command
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Input file(s); merge takes two or more
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Conversion type wire name (see `docmill types`)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub conversion: String,

    /// Conversion options as a JSON object
    #[arg(long, value_name = "JSON")]
    pub options: Option<String>,

    /// Directory to place the output in (defaults to the configured temp dir)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Forwards strategy checkpoints into the controller and echoes each
/// distinct percentage to the terminal.
struct ConsoleProgress {
    controller: Arc<JobController>,
    printed: AtomicU8,
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, percent: u8) {
        self.controller.advance_progress(percent);
        let now = self.controller.progress();
        if self.printed.fetch_max(now, Ordering::Relaxed) < now {
            println!("  {now}%");
        }
    }
}

/// Execute the convert command
pub async fn execute(args: &ConvertArgs, env: &str) -> anyhow::Result<()> {
    let config = super::load_config(env)?;

    let conversion: ConversionType = args.conversion.parse()?;
    let options = match &args.options {
        Some(raw) => {
            let value: serde_json::Value =
                serde_json::from_str(raw).with_context(|| format!("Invalid options JSON: {raw}"))?;
            ConversionOptions::from_parts(conversion, value)?
        }
        None => ConversionOptions::default_for(conversion)?,
    };

    let original_name = args
        .inputs
        .first()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let storage = StorageManager::new(&config.storage).await?;
    let dispatcher = Dispatcher::new(&config.convert);

    let output_dir = match &args.output {
        Some(dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
            dir.clone()
        }
        None => storage.temp_dir().to_path_buf(),
    };

    let controller = Arc::new(JobController::new(conversion, options.clone(), &original_name));
    controller.start()?;
    println!("Converting {original_name} ({conversion})...");

    // Uploading: persist each input into the working area.
    let mut stored: Vec<UploadedFile> = Vec::new();
    for input in &args.inputs {
        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let data = match tokio::fs::read(input).await {
            Ok(data) => data,
            Err(e) => {
                let message = format!("Failed to read {}: {e}", input.display());
                controller.fail(message.clone())?;
                cleanup(&storage, &stored).await;
                anyhow::bail!(message);
            }
        };
        match storage.save_upload(&name, data.into()).await {
            Ok(upload) => stored.push(upload),
            Err(e) => {
                controller.fail(e.to_string())?;
                cleanup(&storage, &stored).await;
                return Err(e.into());
            }
        }
    }

    controller.begin_processing()?;

    let progress = Arc::new(ConsoleProgress {
        controller: controller.clone(),
        printed: AtomicU8::new(0),
    });
    let request = ConvertRequest::new(
        stored.iter().map(|u| u.path.clone()).collect(),
        &original_name,
        options,
        &output_dir,
    )
    .with_progress(progress);

    let result = dispatcher.dispatch(request).await;

    // Inputs are one-shot whatever the outcome.
    cleanup(&storage, &stored).await;

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            controller.fail(e.to_string())?;
            return Err(e.into());
        }
    };

    controller.complete(outcome.output_path.clone())?;
    let artifact = controller.download()?;
    let size = tokio::fs::metadata(&artifact)
        .await
        .map(|m| m.len())
        .unwrap_or(0);

    if outcome.degraded {
        output::print_warning("A fallback weaker than the requested guarantee was used");
    }
    output::print_success(&format!("{conversion} complete"));
    output::print_kv("output", &artifact.display().to_string());
    output::print_kv("size", &format_bytes(size));

    Ok(())
}

async fn cleanup(storage: &StorageManager, stored: &[UploadedFile]) {
    for upload in stored {
        storage.delete_quiet(&upload.path).await;
    }
}

/// Format bytes into a human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
