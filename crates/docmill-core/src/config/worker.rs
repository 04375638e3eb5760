//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Background sweep worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduled sweeper is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for the cleanup sweep (seconds-resolution, six fields).
    #[serde(default = "default_sweep_cron")]
    pub sweep_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sweep_cron: default_sweep_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_sweep_cron() -> String {
    "0 */15 * * * *".to_string()
}
