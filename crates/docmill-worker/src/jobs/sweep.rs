//! Scheduled cleanup sweep.

use std::sync::Arc;

use tokio_cron_scheduler::Job as CronJob;
use tracing::{info, warn};

use docmill_core::error::AppError;
use docmill_core::result::AppResult;
use docmill_storage::sweeper::Sweeper;

use crate::scheduler::CronScheduler;

/// Register the periodic sweep of the upload and temp directories.
///
/// `cron` is a six-field (seconds-resolution) expression from
/// configuration; an invalid expression is a configuration error.
pub async fn register(
    scheduler: &CronScheduler,
    sweeper: Arc<Sweeper>,
    cron: &str,
) -> AppResult<()> {
    let job = CronJob::new_async(cron, move |_uuid, _lock| {
        let sweeper = Arc::clone(&sweeper);
        Box::pin(async move {
            let report = sweeper.sweep().await;
            if report.deleted_count > 0 || !report.errors.is_empty() {
                info!(
                    deleted = report.deleted_count,
                    errors = report.errors.len(),
                    "Scheduled sweep finished"
                );
            }
            for failure in &report.errors {
                warn!(error = %failure, "Sweep entry failed");
            }
        })
    })
    .map_err(|e| {
        AppError::configuration(format!("Invalid sweep cron expression '{cron}': {e}"))
    })?;

    scheduler.add("cleanup_sweep", job).await
}
