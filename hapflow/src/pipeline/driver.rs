//! The top-level pipeline state machine.
//!
//! Sequences preparation, the optional region clip, round 0, the
//! data- and flag-dependent branches, the round-1 graph, the diploid
//! merge, finalization, and optional cleanup. All inter-stage
//! communication happens through artifacts in the output directory;
//! the driver holds no cross-stage state beyond paths.

use crate::artifact::{self, Artifact, RunPaths};
use crate::cleanup;
use crate::config::RunConfig;
use crate::errors::Result;
use crate::executor::StageExecutor;
use crate::pipeline::{round0, round1};
use crate::stage::StageSpec;
use crate::tools::{bcftools, samtools, whatshap};
use crate::vcf;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

/// Which of the three terminal branches produced the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeBranch {
    /// Round 0 found no variation; a header-only call set is the result.
    NoVariants,
    /// The stop-after-round-0 flag ended the run before phasing.
    Round0Only,
    /// The full two-round pipeline ran to completion.
    Completed,
}

/// The terminal result of a run. Exactly one is produced; no stage
/// executes after it.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// The branch that terminated the run.
    pub branch: OutcomeBranch,
    /// The final variant call artifact.
    pub final_vcf: PathBuf,
}

impl PipelineOutcome {
    fn new(branch: OutcomeBranch, final_vcf: PathBuf) -> Self {
        Self { branch, final_vcf }
    }

    /// JSON rendering for the run summary log line.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Drives one pipeline run against an immutable configuration.
#[derive(Debug)]
pub struct Driver {
    config: RunConfig,
    paths: RunPaths,
    executor: StageExecutor,
    command_line: String,
    run_id: Uuid,
}

impl Driver {
    /// Creates a driver for the given configuration. The command line is
    /// recorded verbatim in the final call set's provenance header.
    #[must_use]
    pub fn new(config: RunConfig, command_line: impl Into<String>) -> Self {
        let paths = RunPaths::new(&config.output_dir);
        Self {
            config,
            paths,
            executor: StageExecutor::new(),
            command_line: command_line.into(),
            run_id: Uuid::new_v4(),
        }
    }

    /// The run's artifact path scheme.
    #[must_use]
    pub fn paths(&self) -> &RunPaths {
        &self.paths
    }

    /// Runs the pipeline to its single terminal outcome.
    ///
    /// # Errors
    ///
    /// Any stage failure, missing artifact, or malformed call set aborts
    /// the run; artifacts already produced stay on disk so a rerun against
    /// the same output directory resumes where this one stopped.
    pub async fn run(&self) -> Result<PipelineOutcome> {
        tracing::info!(run_id = %self.run_id, out_dir = %self.paths.out_dir().display(), "starting pipeline");
        let outcome = self.execute().await?;
        // Post-terminal only: no stage runs past this point, whichever
        // branch produced the outcome.
        if self.config.delete_intermediates {
            cleanup::remove_intermediates(self.paths.out_dir(), &outcome.final_vcf)?;
        }
        Ok(outcome)
    }

    /// The branch-aware pipeline body, through exactly one of the three
    /// terminal paths.
    async fn execute(&self) -> Result<PipelineOutcome> {
        std::fs::create_dir_all(self.paths.out_dir())?;

        self.prepare_inputs().await?;
        let alignment = self.extract_region().await?;

        let discovery =
            round0::discover(&self.config, &self.paths, self.executor, &alignment).await?;

        if discovery.record_count == 0 {
            tracing::info!("no variants detected; finishing with the round-0 call set");
            return Ok(PipelineOutcome::new(OutcomeBranch::NoVariants, discovery.calls));
        }
        if self.config.stop_after_round0 {
            tracing::info!("stop after round 0 requested; skipping phasing and round 1");
            return Ok(PipelineOutcome::new(OutcomeBranch::Round0Only, discovery.calls));
        }

        let tagged =
            round0::phase_and_tag(&self.config, &self.paths, self.executor, &alignment).await?;

        let graph = round1::build_graph(&self.config, &self.paths, &tagged)?;
        let report = graph.execute(self.executor).await?;
        tracing::info!(
            stages = report.outcomes.len(),
            duration_ms = report.duration_ms,
            "round 1 complete"
        );

        let final_vcf = self.finalize(&alignment).await?;
        Ok(PipelineOutcome::new(OutcomeBranch::Completed, final_vcf))
    }

    /// Ensures the reference sequence index and the alignment's
    /// positional index exist before anything consumes them.
    async fn prepare_inputs(&self) -> Result<()> {
        let reference = &self.config.reference;
        let faidx = StageSpec::new("prepare_faidx", samtools::faidx(reference))
            .with_input(Artifact::file(reference))
            .with_output(Artifact::file(artifact::fai(reference)));
        self.executor.ensure(&faidx).await?;

        let alignment = &self.config.alignment;
        let index = StageSpec::new("prepare_index", samtools::index(alignment))
            .with_input(Artifact::file(alignment))
            .with_output(Artifact::file(artifact::bai(alignment)));
        self.executor.ensure(&index).await?;
        Ok(())
    }

    /// Clips the alignment to the configured regions, if any. The phasing
    /// engine has no native region filter, so the clipped alignment
    /// replaces the input for the whole run.
    async fn extract_region(&self) -> Result<PathBuf> {
        if self.config.regions.is_empty() {
            return Ok(self.config.alignment.clone());
        }

        let clipped = self.paths.region_alignment();
        let clip = StageSpec::new(
            "region_extract",
            samtools::view_regions(&self.config.alignment, &clipped, &self.config.regions),
        )
        .with_input(Artifact::alignment(&self.config.alignment))
        .with_output(Artifact::file(&clipped));
        self.executor.ensure(&clip).await?;

        let index = StageSpec::new("region_index", samtools::index(&clipped))
            .with_input(Artifact::file(&clipped))
            .with_output(Artifact::file(artifact::bai(&clipped)));
        self.executor.ensure(&index).await?;

        Ok(clipped)
    }

    /// Provenance, sample rename, optional quality filter, and the final
    /// phase/unphase selection.
    async fn finalize(&self, alignment: &std::path::Path) -> Result<PathBuf> {
        let annotated = self.paths.annotated();
        if annotated.exists() {
            tracing::info!(calls = %annotated.display(), "annotated call set present, reused");
        } else {
            vcf::inject_provenance(
                &self.paths.merged(),
                &annotated,
                &self.command_line,
                &chrono::Utc::now().to_rfc3339(),
            )?;
        }
        vcf::rename_sample(&annotated, &self.config.sample_name)?;

        let selected = if self.config.filtering {
            let filtered = self.paths.filtered();
            let filter = StageSpec::new(
                "finalize_filter",
                bcftools::soft_filter(
                    &annotated,
                    &filtered,
                    self.config.snp_threshold,
                    self.config.indel_threshold,
                ),
            )
            .with_input(Artifact::file(&annotated))
            .with_output(Artifact::file(&filtered));
            self.executor.ensure(&filter).await?;
            filtered
        } else {
            tracing::info!("quality filtering disabled; merged call set passes through");
            annotated
        };

        if self.config.phased_output {
            let phased = self.paths.final_phased();
            let phase = StageSpec::new(
                "finalize_phase",
                whatshap::phase(&selected, &phased, &self.config.reference, alignment),
            )
            .with_input(Artifact::file(&selected))
            .with_input(Artifact::reference(&self.config.reference))
            .with_input(Artifact::alignment(alignment))
            .with_output(Artifact::file(&phased));
            self.executor.ensure(&phase).await?;
            Ok(phased)
        } else {
            let unphased = self.paths.final_unphased();
            let unphase = StageSpec::new(
                "finalize_unphase",
                whatshap::unphase(&selected, &unphased),
            )
            .with_input(Artifact::file(&selected))
            .with_output(Artifact::file(&unphased));
            self.executor.ensure(&unphase).await?;
            Ok(unphased)
        }
    }
}
