//! The caching gate around external tool invocation.
//!
//! `ensure` is the only way a stage runs: outputs already present means
//! the stage is reused without touching the command; a missing input
//! aborts before anything is spawned; a nonzero exit aborts the run with
//! partial outputs left on disk for inspection. The caching key is
//! artifact presence, not a parameter hash, so reruns against a populated
//! output directory reuse whatever is there.

use crate::errors::{HapflowError, Result};
use crate::stage::{StageOutcome, StageSpec};
use std::time::Instant;
use tokio::process::Command;

/// Executes stages behind the presence-based caching gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageExecutor;

impl StageExecutor {
    /// Creates an executor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Brings a stage's outputs into existence.
    ///
    /// # Errors
    ///
    /// Fails when a required input (or companion index) is absent, when
    /// the command cannot be spawned, or when it exits nonzero. No retry
    /// is attempted and no partial outputs are cleaned up.
    pub async fn ensure(&self, stage: &StageSpec) -> Result<StageOutcome> {
        if stage.outputs_present() {
            tracing::info!(stage = %stage.name, "outputs present, stage reused");
            return Ok(StageOutcome::reused(&stage.name));
        }

        if let Some(path) = stage.first_missing_input() {
            return Err(HapflowError::missing_artifact(&stage.name, path));
        }

        tracing::info!(stage = %stage.name, command = %stage.command, "running stage");
        let start = Instant::now();
        let status = Command::new(stage.command.program())
            .args(stage.command.argv())
            .status()
            .await?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        if !status.success() {
            return Err(HapflowError::ToolExecution {
                stage: stage.name.clone(),
                command: stage.command.to_string(),
                status,
            });
        }

        tracing::info!(stage = %stage.name, duration_ms, "stage completed");
        Ok(StageOutcome::ran(&stage.name, duration_ms))
    }
}
