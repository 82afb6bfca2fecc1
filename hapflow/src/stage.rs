//! Stage specifications and outcomes.
//!
//! A stage is a declared unit of work: required input artifacts, declared
//! output artifacts, and the external command that produces the latter
//! from the former. Stages hold no state between invocations; re-running
//! a stage whose outputs already exist is a no-op.

use crate::artifact::Artifact;
use crate::errors::{HapflowError, Result};
use crate::tools::ToolCommand;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Specification for a single stage.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// The unique name of the stage.
    pub name: String,
    /// The external command to run.
    pub command: ToolCommand,
    /// Artifacts that must be present before the command runs.
    pub inputs: Vec<Artifact>,
    /// Artifacts the command produces; their presence skips the stage.
    pub outputs: Vec<Artifact>,
    /// Names of stages this stage depends on (graph execution only).
    pub dependencies: HashSet<String>,
}

impl StageSpec {
    /// Creates a new stage specification.
    #[must_use]
    pub fn new(name: impl Into<String>, command: ToolCommand) -> Self {
        Self {
            name: name.into(),
            command,
            inputs: Vec::new(),
            outputs: Vec::new(),
            dependencies: HashSet::new(),
        }
    }

    /// Adds a required input artifact.
    #[must_use]
    pub fn with_input(mut self, input: Artifact) -> Self {
        self.inputs.push(input);
        self
    }

    /// Adds a declared output artifact.
    #[must_use]
    pub fn with_output(mut self, output: Artifact) -> Self {
        self.outputs.push(output);
        self
    }

    /// Adds a dependency edge.
    #[must_use]
    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.insert(dep.into());
        self
    }

    /// Validates the specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage depends on itself or declares no
    /// outputs.
    pub fn validate(&self) -> Result<()> {
        if self.dependencies.contains(&self.name) {
            return Err(HapflowError::Graph(format!(
                "stage '{}' cannot depend on itself",
                self.name
            )));
        }
        if self.outputs.is_empty() {
            return Err(HapflowError::Graph(format!(
                "stage '{}' declares no outputs",
                self.name
            )));
        }
        Ok(())
    }

    /// True when every declared output is already present on disk.
    #[must_use]
    pub fn outputs_present(&self) -> bool {
        !self.outputs.is_empty() && self.outputs.iter().all(Artifact::is_present)
    }

    /// The first missing input path, if any.
    #[must_use]
    pub fn first_missing_input(&self) -> Option<PathBuf> {
        self.inputs.iter().find_map(Artifact::first_missing)
    }
}

/// How a stage reached completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// The external command was run to completion.
    Ran,
    /// All declared outputs were already present; nothing was run.
    Reused,
}

/// The outcome of one stage, as seen by the driver.
#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    /// The stage's name.
    pub stage: String,
    /// Whether the command ran or the outputs were reused.
    pub status: StageStatus,
    /// Wall-clock duration in milliseconds (zero when reused).
    pub duration_ms: f64,
}

impl StageOutcome {
    /// Outcome for a stage that ran its command.
    #[must_use]
    pub fn ran(stage: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Ran,
            duration_ms,
        }
    }

    /// Outcome for a stage skipped by the caching gate.
    #[must_use]
    pub fn reused(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: StageStatus::Reused,
            duration_ms: 0.0,
        }
    }

    /// True when the caching gate skipped execution.
    #[must_use]
    pub fn is_reused(&self) -> bool {
        self.status == StageStatus::Reused
    }
}
