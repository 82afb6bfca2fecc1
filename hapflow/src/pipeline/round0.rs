//! Round 0: the mixed-sample discovery pass.
//!
//! Consensus probabilities over the whole alignment and an unphased SNP
//! call set; when the driver decides to continue, phasing, compression,
//! haplotagging, and read-group rewriting follow, ending in the
//! haplotype-annotated alignment round 1 consumes.

use crate::artifact::{self, Artifact, RunPaths};
use crate::config::RunConfig;
use crate::errors::Result;
use crate::executor::StageExecutor;
use crate::stage::StageSpec;
use crate::tools::{htsfile, medaka, samtools, whatshap};
use crate::vcf;
use std::path::{Path, PathBuf};

/// What the discovery pass produced.
#[derive(Debug, Clone)]
pub struct Discovery {
    /// The sample-renamed unphased SNP call set.
    pub calls: PathBuf,
    /// Number of data records in it.
    pub record_count: usize,
}

/// Runs consensus and SNP calling over the mixed sample, renames the
/// generic sample placeholder, and counts the resulting records.
///
/// # Errors
///
/// Fails on any stage failure or a malformed call set.
pub async fn discover(
    config: &RunConfig,
    paths: &RunPaths,
    executor: StageExecutor,
    alignment: &Path,
) -> Result<Discovery> {
    let probs = paths.round0_probs();
    let consensus = StageSpec::new(
        "round0_consensus",
        medaka::consensus(
            alignment,
            &probs,
            config.snp_model.as_deref(),
            config.threads,
            config.batch_size,
            None,
        ),
    )
    .with_input(Artifact::alignment(alignment))
    .with_output(Artifact::file(&probs));
    executor.ensure(&consensus).await?;

    let calls = paths.round0_unphased();
    let snp = StageSpec::new(
        "round0_snp",
        medaka::snp(&config.reference, &probs, &calls),
    )
    .with_input(Artifact::file(&config.reference))
    .with_input(Artifact::file(&probs))
    .with_output(Artifact::file(&calls));
    executor.ensure(&snp).await?;

    vcf::rename_sample(&calls, &config.sample_name)?;
    let record_count = vcf::count_records(&calls)?;
    tracing::info!(records = record_count, calls = %calls.display(), "round-0 discovery complete");

    Ok(Discovery {
        calls,
        record_count,
    })
}

/// Phases the discovery call set, haplotags the alignment with it, and
/// rewrites the read group, producing the indexed haplotype-annotated
/// alignment.
///
/// # Errors
///
/// Fails on any stage failure.
pub async fn phase_and_tag(
    config: &RunConfig,
    paths: &RunPaths,
    executor: StageExecutor,
    alignment: &Path,
) -> Result<PathBuf> {
    let calls = paths.round0_unphased();
    let phased = paths.round0_phased();
    let phase = StageSpec::new(
        "round0_phase",
        whatshap::phase(&calls, &phased, &config.reference, alignment),
    )
    .with_input(Artifact::file(&calls))
    .with_input(Artifact::reference(&config.reference))
    .with_input(Artifact::alignment(alignment))
    .with_output(Artifact::file(&phased));
    executor.ensure(&phase).await?;

    let phased_gz = paths.round0_phased_gz();
    let compress = StageSpec::new("round0_compress", htsfile::bgzip(&phased))
        .with_input(Artifact::file(&phased))
        .with_output(Artifact::file(&phased_gz));
    executor.ensure(&compress).await?;

    let index_calls = StageSpec::new("round0_index_calls", htsfile::tabix(&phased_gz))
        .with_input(Artifact::file(&phased_gz))
        .with_output(Artifact::file(artifact::tbi(&phased_gz)));
    executor.ensure(&index_calls).await?;

    let tagged = paths.round0_tagged();
    let haplotag = StageSpec::new(
        "round0_haplotag",
        whatshap::haplotag(&phased_gz, alignment, &config.reference, &tagged),
    )
    .with_input(Artifact::indexed_calls(&phased_gz))
    .with_input(Artifact::reference(&config.reference))
    .with_input(Artifact::alignment(alignment))
    .with_output(Artifact::file(&tagged));
    executor.ensure(&haplotag).await?;

    let tagged_rg = paths.round0_tagged_rg();
    let rewrite = StageSpec::new(
        "round0_read_group",
        samtools::replace_read_group(&tagged, &tagged_rg, &config.sample_name),
    )
    .with_input(Artifact::file(&tagged))
    .with_output(Artifact::file(&tagged_rg));
    executor.ensure(&rewrite).await?;

    let index = StageSpec::new("round0_index_tagged", samtools::index(&tagged_rg))
        .with_input(Artifact::file(&tagged_rg))
        .with_output(Artifact::file(artifact::bai(&tagged_rg)));
    executor.ensure(&index).await?;

    Ok(tagged_rg)
}
