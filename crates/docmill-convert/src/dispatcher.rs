//! Job dispatch: strategy lookup, admission control, scratch directories.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{info, warn};
use uuid::Uuid;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::config::convert::ConvertConfig;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};

use crate::strategies;
use crate::strategy::{ConversionStrategy, ConvertRequest};
use crate::tool::{ToolExecutor, ToolProbe};

/// Routes requests to the strategy registered for their conversion type.
///
/// A global semaphore caps how many conversions run at once. Each job gets
/// a private scratch directory under the destination; the output is moved
/// into place only on success, so a failed or panicked job never leaves a
/// partial artifact where a download could find it.
pub struct Dispatcher {
    strategies: HashMap<ConversionType, Arc<dyn ConversionStrategy>>,
    permits: Arc<Semaphore>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("strategies", &self.strategies.len())
            .field("permits", &self.permits)
            .finish()
    }
}

impl Dispatcher {
    /// Build the full production registry from configuration.
    pub fn new(config: &ConvertConfig) -> Self {
        let executor = ToolExecutor::new(config);
        let probe = Arc::new(ToolProbe::default());
        Self::from_strategies(strategies::all(config, executor, probe), config.max_concurrent)
    }

    /// Build a dispatcher over an explicit strategy set.
    pub fn from_strategies(
        strategies: Vec<Arc<dyn ConversionStrategy>>,
        max_concurrent: usize,
    ) -> Self {
        let strategies = strategies
            .into_iter()
            .map(|s| (s.conversion(), s))
            .collect();
        Self {
            strategies,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// The strategy registered for a conversion type, if any.
    pub fn strategy(&self, conversion: ConversionType) -> Option<&Arc<dyn ConversionStrategy>> {
        self.strategies.get(&conversion)
    }

    /// Registered conversion types, in display order.
    pub fn conversions(&self) -> Vec<ConversionType> {
        ConversionType::ALL
            .into_iter()
            .filter(|c| self.strategies.contains_key(c))
            .collect()
    }

    /// Run a conversion. `request.output_dir` is the directory the final
    /// artifact must land in; the strategy itself only ever sees a scratch
    /// subdirectory of it.
    pub async fn dispatch(&self, request: ConvertRequest) -> AppResult<ConvertOutcome> {
        let conversion = request.options.kind();
        let strategy = self
            .strategies
            .get(&conversion)
            .cloned()
            .ok_or_else(|| {
                AppError::unsupported_conversion(format!(
                    "Unsupported conversion type: {conversion}"
                ))
            })?;
        validate_input_count(&request, conversion)?;

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::internal("Dispatcher is shut down"))?;

        let dest = request.output_dir.clone();
        let scratch = dest.join(format!(".job-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&scratch).await?;

        info!(
            conversion = %conversion,
            inputs = request.inputs.len(),
            "Dispatching conversion"
        );
        let started = Instant::now();

        let scoped = ConvertRequest {
            output_dir: scratch.clone(),
            ..request
        };
        let result = strategy.convert(&scoped).await;
        drop(permit);

        match result {
            Ok(outcome) => {
                let file_name = outcome.file_name();
                if file_name.is_empty() {
                    remove_scratch(&scratch).await;
                    return Err(AppError::internal("Strategy returned an invalid output path"));
                }
                let final_path = dest.join(&file_name);
                tokio::fs::rename(&outcome.output_path, &final_path).await?;
                remove_scratch(&scratch).await;

                info!(
                    conversion = %conversion,
                    output = %file_name,
                    degraded = outcome.degraded,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Conversion finished"
                );
                Ok(ConvertOutcome {
                    output_path: final_path,
                    degraded: outcome.degraded,
                })
            }
            Err(e) => {
                remove_scratch(&scratch).await;
                warn!(
                    conversion = %conversion,
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Conversion failed"
                );
                Err(e)
            }
        }
    }
}

fn validate_input_count(request: &ConvertRequest, conversion: ConversionType) -> AppResult<()> {
    let count = request.inputs.len();
    if count == 0 {
        return Err(AppError::validation("No input file provided"));
    }
    if conversion.is_multi_input() {
        if count < 2 {
            return Err(AppError::validation("Merge requires at least 2 input files"));
        }
    } else if count > 1 {
        return Err(AppError::validation(format!(
            "{conversion} takes exactly one input file"
        )));
    }
    Ok(())
}

async fn remove_scratch(scratch: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(scratch).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(dir = %scratch.display(), error = %e, "Failed to remove scratch directory");
        }
    }
}
