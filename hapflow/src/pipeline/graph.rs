//! Dependency-graph execution of stages.
//!
//! Stages are scheduled as soon as their dependencies are met, so
//! independent branches run concurrently; a stage with dependency edges
//! starts only after every producer has fully completed. The first
//! failure aborts the graph.

use crate::errors::{HapflowError, Result};
use crate::executor::StageExecutor;
use crate::stage::{StageOutcome, StageSpec};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Result of executing a stage graph.
#[derive(Debug)]
pub struct GraphReport {
    /// Per-stage outcomes, keyed by stage name.
    pub outcomes: HashMap<String, StageOutcome>,
    /// Total execution time in milliseconds.
    pub duration_ms: f64,
}

impl GraphReport {
    /// True when every stage was skipped by the caching gate.
    #[must_use]
    pub fn all_reused(&self) -> bool {
        self.outcomes.values().all(StageOutcome::is_reused)
    }
}

/// A directed acyclic graph of stages.
#[derive(Debug)]
pub struct StageGraph {
    name: String,
    stages: HashMap<String, StageSpec>,
}

impl StageGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: HashMap::new(),
        }
    }

    /// The graph's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Adds a stage.
    ///
    /// # Errors
    ///
    /// Fails when the stage is invalid or its name is already taken.
    pub fn add(&mut self, stage: StageSpec) -> Result<()> {
        stage.validate()?;
        if self.stages.contains_key(&stage.name) {
            return Err(HapflowError::Graph(format!(
                "duplicate stage name '{}' in graph '{}'",
                stage.name, self.name
            )));
        }
        self.stages.insert(stage.name.clone(), stage);
        Ok(())
    }

    /// Validates dependency edges: every dependency must name a known
    /// stage, and the graph must be acyclic.
    ///
    /// # Errors
    ///
    /// Fails on unknown dependencies or cycles.
    pub fn validate(&self) -> Result<()> {
        for stage in self.stages.values() {
            for dep in &stage.dependencies {
                if !self.stages.contains_key(dep) {
                    return Err(HapflowError::Graph(format!(
                        "stage '{}' depends on unknown stage '{dep}'",
                        stage.name
                    )));
                }
            }
        }

        // Kahn's algorithm; anything left over sits on a cycle.
        let mut in_degree: HashMap<&str, usize> = self
            .stages
            .iter()
            .map(|(name, spec)| (name.as_str(), spec.dependencies.len()))
            .collect();
        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut seen = 0;
        while let Some(current) = ready.pop() {
            seen += 1;
            for (name, spec) in &self.stages {
                if spec.dependencies.contains(current) {
                    if let Some(count) = in_degree.get_mut(name.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            ready.push(name.as_str());
                        }
                    }
                }
            }
        }
        if seen != self.stages.len() {
            let cyclic: Vec<&str> = in_degree
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(name, _)| *name)
                .collect();
            return Err(HapflowError::Graph(format!(
                "dependency cycle in graph '{}' involving {cyclic:?}",
                self.name
            )));
        }
        Ok(())
    }

    /// Executes the graph, scheduling every stage whose dependencies are
    /// satisfied concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; stages already running are
    /// abandoned, their partial outputs left on disk.
    pub async fn execute(&self, executor: StageExecutor) -> Result<GraphReport> {
        self.validate()?;
        let start = Instant::now();

        let mut in_degree: HashMap<String, usize> = self
            .stages
            .iter()
            .map(|(name, spec)| (name.clone(), spec.dependencies.len()))
            .collect();
        let mut outcomes: HashMap<String, StageOutcome> = HashMap::new();
        let mut active: FuturesUnordered<JoinHandle<Result<(String, StageOutcome)>>> =
            FuturesUnordered::new();

        let ready: Vec<String> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(name, _)| name.clone())
            .collect();
        for name in ready {
            active.push(self.spawn(&name, executor));
        }

        while outcomes.len() < self.stages.len() {
            let Some(joined) = active.next().await else {
                let pending: Vec<&String> = self
                    .stages
                    .keys()
                    .filter(|name| !outcomes.contains_key(*name))
                    .collect();
                return Err(HapflowError::Graph(format!(
                    "deadlocked graph '{}'; remaining stages: {pending:?}",
                    self.name
                )));
            };
            let (name, outcome) = joined
                .map_err(|e| HapflowError::Graph(format!("stage task join error: {e}")))??;
            tracing::debug!(graph = %self.name, stage = %name, status = ?outcome.status, "stage settled");
            outcomes.insert(name.clone(), outcome);

            for (child, spec) in &self.stages {
                if spec.dependencies.contains(&name) {
                    if let Some(count) = in_degree.get_mut(child) {
                        *count = count.saturating_sub(1);
                        if *count == 0 && !outcomes.contains_key(child) {
                            active.push(self.spawn(child, executor));
                        }
                    }
                }
            }
        }

        Ok(GraphReport {
            outcomes,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        })
    }

    fn spawn(
        &self,
        name: &str,
        executor: StageExecutor,
    ) -> JoinHandle<Result<(String, StageOutcome)>> {
        let spec = self.stages[name].clone();
        tokio::spawn(async move {
            let outcome = executor.ensure(&spec).await?;
            Ok((spec.name, outcome))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::Artifact;
    use crate::stage::StageStatus;
    use crate::tools::ToolCommand;
    use std::path::Path;

    fn touch_stage(name: &str, out: &Path) -> StageSpec {
        StageSpec::new(
            name,
            ToolCommand::new("sh")
                .arg("-c")
                .arg(format!("touch {}", out.display())),
        )
        .with_output(Artifact::file(out))
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut graph = StageGraph::new("test");
        graph.add(touch_stage("a", Path::new("/tmp/a"))).unwrap();
        assert!(graph.add(touch_stage("a", Path::new("/tmp/a2"))).is_err());
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let mut graph = StageGraph::new("test");
        graph
            .add(touch_stage("a", Path::new("/tmp/a")).with_dependency("ghost"))
            .unwrap();
        assert!(graph.validate().is_err());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut graph = StageGraph::new("test");
        graph
            .add(touch_stage("a", Path::new("/tmp/a")).with_dependency("b"))
            .unwrap();
        graph
            .add(touch_stage("b", Path::new("/tmp/b")).with_dependency("a"))
            .unwrap();
        let err = graph.validate().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[tokio::test]
    async fn executes_all_stages_respecting_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let merge = dir.path().join("merge");

        let mut graph = StageGraph::new("round-1");
        graph.add(touch_stage("branch_a", &a)).unwrap();
        graph.add(touch_stage("branch_b", &b)).unwrap();
        // The barrier only runs once both branch outputs exist.
        graph
            .add(
                StageSpec::new(
                    "merge",
                    ToolCommand::new("sh").arg("-c").arg(format!(
                        "test -f {} && test -f {} && touch {}",
                        a.display(),
                        b.display(),
                        merge.display()
                    )),
                )
                .with_input(Artifact::file(&a))
                .with_input(Artifact::file(&b))
                .with_output(Artifact::file(&merge))
                .with_dependency("branch_a")
                .with_dependency("branch_b"),
            )
            .unwrap();

        let report = graph.execute(StageExecutor::new()).await.unwrap();
        assert_eq!(report.outcomes.len(), 3);
        assert!(merge.exists());
        assert_eq!(report.outcomes["merge"].status, StageStatus::Ran);
    }

    #[tokio::test]
    async fn branch_failure_aborts_the_graph() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = StageGraph::new("round-1");
        graph
            .add(
                StageSpec::new("boom", ToolCommand::new("false"))
                    .with_output(Artifact::file(dir.path().join("never"))),
            )
            .unwrap();
        graph
            .add(touch_stage("after", &dir.path().join("after")).with_dependency("boom"))
            .unwrap();

        let err = graph.execute(StageExecutor::new()).await.unwrap_err();
        assert!(matches!(err, HapflowError::ToolExecution { .. }));
        assert!(!dir.path().join("after").exists());
    }

    #[tokio::test]
    async fn present_outputs_reuse_the_whole_graph() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"x").unwrap();

        let mut graph = StageGraph::new("resume");
        // Commands would fail if the gate let them run.
        graph
            .add(
                StageSpec::new("branch_a", ToolCommand::new("false"))
                    .with_output(Artifact::file(&a)),
            )
            .unwrap();
        graph
            .add(
                StageSpec::new("branch_b", ToolCommand::new("false"))
                    .with_output(Artifact::file(&b))
                    .with_dependency("branch_a"),
            )
            .unwrap();

        let report = graph.execute(StageExecutor::new()).await.unwrap();
        assert!(report.all_reused());
    }
}
