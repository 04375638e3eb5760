//! Progress reporting for long-running conversions.

/// Sink that conversion strategies report completion percentages into.
///
/// Strategies call [`report`](ProgressSink::report) at defined checkpoints
/// rather than logging progress lines. Reported values are percentages;
/// consumers must tolerate repeated or out-of-order values and clamp to
/// their own monotonic view.
pub trait ProgressSink: Send + Sync {
    /// Report completion as a percentage in `0..=100`.
    fn report(&self, percent: u8);
}

/// A sink that discards all progress reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _percent: u8) {}
}
