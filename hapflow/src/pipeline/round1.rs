//! Round 1: per-haplotype calling and the diploid merge.
//!
//! The two haplotype branches read the same haplotype-annotated alignment
//! and write disjoint artifacts, so they carry no ordering dependency on
//! each other; the merge node is the barrier that joins them.

use crate::artifact::{Artifact, HaplotypeLabel, RunPaths};
use crate::config::RunConfig;
use crate::errors::Result;
use crate::pipeline::graph::StageGraph;
use crate::stage::StageSpec;
use crate::tools::medaka;
use std::path::Path;

/// Builds the round-1 dependency graph: consensus and variant calling for
/// each haplotype, joined by the diploid merge.
///
/// # Errors
///
/// Fails if the graph construction itself is invalid.
pub fn build_graph(
    config: &RunConfig,
    paths: &RunPaths,
    tagged_alignment: &Path,
) -> Result<StageGraph> {
    let mut graph = StageGraph::new("round-1");
    let mut merge = StageSpec::new(
        "round1_merge",
        medaka::haploid2diploid(
            &paths.round1_calls(HaplotypeLabel::Hap1),
            &paths.round1_calls(HaplotypeLabel::Hap2),
            &config.reference,
            &paths.merged(),
            config.split_mnv,
        ),
    )
    .with_input(Artifact::file(&config.reference))
    .with_output(Artifact::file(paths.merged()));

    for hap in HaplotypeLabel::BOTH {
        let probs = paths.round1_probs(hap);
        let calls = paths.round1_calls(hap);
        let consensus_name = format!("round1_consensus_hap{hap}");
        let variant_name = format!("round1_variant_hap{hap}");

        graph.add(
            StageSpec::new(
                &consensus_name,
                medaka::consensus(
                    tagged_alignment,
                    &probs,
                    config.variant_model.as_deref(),
                    config.threads,
                    config.batch_size,
                    Some(hap),
                ),
            )
            .with_input(Artifact::alignment(tagged_alignment))
            .with_output(Artifact::file(&probs)),
        )?;

        graph.add(
            StageSpec::new(
                &variant_name,
                medaka::variant(&config.reference, &probs, &calls),
            )
            .with_input(Artifact::file(&config.reference))
            .with_input(Artifact::file(&probs))
            .with_output(Artifact::file(&calls))
            .with_dependency(&consensus_name),
        )?;

        merge = merge
            .with_input(Artifact::file(&calls))
            .with_dependency(&variant_name);
    }

    graph.add(merge)?;
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_config(dir: &Path) -> RunConfig {
        RunConfig {
            alignment: dir.join("reads.bam"),
            reference: dir.join("ref.fasta"),
            regions: Vec::new(),
            output_dir: dir.join("out"),
            snp_model: None,
            variant_model: Some("r941_min_high".to_string()),
            threads: 2,
            batch_size: 100,
            phased_output: false,
            delete_intermediates: false,
            indel_threshold: 9.0,
            snp_threshold: 8.0,
            filtering: true,
            stop_after_round0: false,
            split_mnv: false,
            sample_name: "SAMPLE".to_string(),
        }
    }

    #[test]
    fn graph_has_both_branches_and_the_barrier() {
        let dir = PathBuf::from("/data");
        let config = test_config(&dir);
        let paths = RunPaths::new("/data/out");
        let graph = build_graph(&config, &paths, Path::new("/data/out/tagged.bam")).unwrap();

        assert_eq!(graph.stage_count(), 5);
        graph.validate().unwrap();
    }
}
