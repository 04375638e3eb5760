//! Cached availability probing for external binaries.

use std::process::Stdio;
use std::time::Duration;

use dashmap::DashMap;
use tokio::process::Command;
use tracing::{debug, info};

/// How long a probe may take before the binary counts as unavailable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-process cache of which external binaries can be executed.
///
/// A binary counts as available when it spawns at all; the exit status is
/// ignored because version flags differ between tools. Each path is probed
/// once and the answer remembered for the life of the process.
#[derive(Debug, Default)]
pub struct ToolProbe {
    results: DashMap<String, bool>,
}

impl ToolProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `bin` can be executed, probing on first ask.
    pub async fn available(&self, bin: &str) -> bool {
        if let Some(cached) = self.results.get(bin) {
            return *cached;
        }

        let mut cmd = Command::new(bin);
        cmd.arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let available = matches!(
            tokio::time::timeout(PROBE_TIMEOUT, cmd.status()).await,
            Ok(Ok(_))
        );

        if available {
            debug!(bin, "External tool available");
        } else {
            info!(bin, "External tool not available; fallbacks apply");
        }
        self.results.insert(bin.to_string(), available);
        available
    }

    /// Pre-seed a probe result, overriding any cached answer.
    ///
    /// Startup checks use this to record results probed eagerly; tests use
    /// it to force fallback paths.
    pub fn preset(&self, bin: impl Into<String>, available: bool) {
        self.results.insert(bin.into(), available);
    }
}
