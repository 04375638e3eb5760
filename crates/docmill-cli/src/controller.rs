//! Client-side job state machine.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::traits::progress::ProgressSink;
use docmill_entity::conversion::ConversionType;
use docmill_entity::job::{ConversionJob, JobStatus};
use docmill_entity::options::ConversionOptions;

/// Drives one conversion job through its lifecycle.
///
/// Transitions follow `idle → uploading → processing → completed | error`;
/// anything else is rejected and leaves the job untouched. Terminal states
/// return to `idle` only through [`reset`](JobController::reset), and no
/// transition ever happens from the passage of time alone.
///
/// The controller is the [`ProgressSink`] for its own job: strategy
/// checkpoints land here and are folded into a monotonic percentage.
#[derive(Debug)]
pub struct JobController {
    job: Mutex<ConversionJob>,
}

impl JobController {
    /// Create a controller for a fresh idle job.
    pub fn new(
        conversion: ConversionType,
        options: ConversionOptions,
        input_name: impl Into<String>,
    ) -> Self {
        Self {
            job: Mutex::new(ConversionJob::new(conversion, options, input_name)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ConversionJob> {
        // Every update writes a complete field, so a poisoned lock still
        // holds a consistent record.
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Begin the job: `idle → uploading`.
    pub fn start(&self) -> AppResult<()> {
        let mut job = self.lock();
        if job.status != JobStatus::Idle {
            return Err(invalid_transition(job.status, JobStatus::Uploading));
        }
        job.status = JobStatus::Uploading;
        Ok(())
    }

    /// Input is persisted: `uploading → processing`.
    pub fn begin_processing(&self) -> AppResult<()> {
        let mut job = self.lock();
        if job.status != JobStatus::Uploading {
            return Err(invalid_transition(job.status, JobStatus::Processing));
        }
        job.status = JobStatus::Processing;
        Ok(())
    }

    /// Move progress forward while the job is in flight.
    ///
    /// Values never decrease: stale or repeated reports are absorbed, and
    /// reports outside `uploading`/`processing` are ignored entirely.
    pub fn advance_progress(&self, percent: u8) {
        let mut job = self.lock();
        if matches!(job.status, JobStatus::Uploading | JobStatus::Processing) {
            job.progress = job.progress.max(percent.min(100));
        }
    }

    /// Finish successfully: `processing → completed`.
    ///
    /// Completion forces progress to 100 and records the artifact path.
    pub fn complete(&self, output_path: PathBuf) -> AppResult<()> {
        let mut job = self.lock();
        if job.status != JobStatus::Processing {
            return Err(invalid_transition(job.status, JobStatus::Completed));
        }
        job.status = JobStatus::Completed;
        job.progress = 100;
        job.output_path = Some(output_path);
        Ok(())
    }

    /// Finish in failure: `uploading | processing → error`.
    pub fn fail(&self, message: impl Into<String>) -> AppResult<()> {
        let mut job = self.lock();
        if !matches!(job.status, JobStatus::Uploading | JobStatus::Processing) {
            return Err(invalid_transition(job.status, JobStatus::Error));
        }
        job.status = JobStatus::Error;
        job.error = Some(message.into());
        Ok(())
    }

    /// The stored artifact. Only a completed job has one.
    pub fn download(&self) -> AppResult<PathBuf> {
        let job = self.lock();
        match (&job.status, &job.output_path) {
            (JobStatus::Completed, Some(path)) => Ok(path.clone()),
            _ => Err(AppError::validation(format!(
                "Download requires a completed job (currently {})",
                job.status
            ))),
        }
    }

    /// Return a terminal job to `idle` for another run.
    ///
    /// The conversion, options, and input name carry over; id, progress,
    /// output, and error start fresh.
    pub fn reset(&self) -> AppResult<()> {
        let mut job = self.lock();
        if !job.status.is_terminal() {
            return Err(invalid_transition(job.status, JobStatus::Idle));
        }
        *job = ConversionJob::new(job.conversion, job.options.clone(), job.input_name.clone());
        Ok(())
    }

    /// Current lifecycle state.
    pub fn status(&self) -> JobStatus {
        self.lock().status
    }

    /// Current completion percentage.
    pub fn progress(&self) -> u8 {
        self.lock().progress
    }

    /// A point-in-time copy of the job record.
    pub fn snapshot(&self) -> ConversionJob {
        self.lock().clone()
    }
}

impl ProgressSink for JobController {
    fn report(&self, percent: u8) {
        self.advance_progress(percent);
    }
}

fn invalid_transition(from: JobStatus, to: JobStatus) -> AppError {
    AppError::validation(format!("Cannot move a job from {from} to {to}"))
}
