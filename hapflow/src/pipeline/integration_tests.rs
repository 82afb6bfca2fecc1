//! Driver-level tests.
//!
//! Every test pre-populates the output directory so the caching gate
//! reuses the artifacts a branch needs; if the driver tried to run any
//! external tool the spawn would fail and the test with it. This is the
//! same mechanism a resumed production run relies on.

use crate::artifact::{self, HaplotypeLabel, RunPaths};
use crate::config::RunConfig;
use crate::pipeline::{Driver, OutcomeBranch};
use std::fs;
use std::path::Path;

const COMMAND_LINE: &str = "hapflow -i reads.bam -f ref.fasta";

fn test_config(dir: &Path) -> RunConfig {
    RunConfig {
        alignment: dir.join("reads.bam"),
        reference: dir.join("ref.fasta"),
        regions: Vec::new(),
        output_dir: dir.join("out"),
        snp_model: None,
        variant_model: None,
        threads: 1,
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

fn write_vcf(path: &Path, records: usize) {
    let mut lines = vec![
        "##fileformat=VCFv4.1".to_string(),
        "##contig=<ID=chr20>".to_string(),
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE".to_string(),
    ];
    for i in 0..records {
        lines.push(format!(
            "chr20\t{}\t.\tA\tT\t12.3\tPASS\t.\tGT\t1|0",
            100 + i
        ));
    }
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(path, body).unwrap();
}

/// Input files plus the round-0 artifacts the discovery pass declares.
fn populate_inputs_and_round0(config: &RunConfig, records: usize) -> RunPaths {
    fs::write(&config.alignment, b"bam").unwrap();
    fs::write(artifact::bai(&config.alignment), b"bai").unwrap();
    fs::write(&config.reference, b"fasta").unwrap();
    fs::write(artifact::fai(&config.reference), b"fai").unwrap();

    let paths = RunPaths::new(&config.output_dir);
    fs::create_dir_all(paths.out_dir()).unwrap();
    fs::write(paths.round0_probs(), b"hdf").unwrap();
    write_vcf(&paths.round0_unphased(), records);
    paths
}

/// Everything a completed two-round run leaves behind.
fn populate_completed_run(config: &RunConfig, paths: &RunPaths) {
    write_vcf(&paths.round0_phased(), 1);
    fs::write(paths.round0_phased_gz(), b"gz").unwrap();
    fs::write(artifact::tbi(&paths.round0_phased_gz()), b"tbi").unwrap();
    fs::write(paths.round0_tagged(), b"bam").unwrap();
    fs::write(paths.round0_tagged_rg(), b"bam").unwrap();
    fs::write(artifact::bai(&paths.round0_tagged_rg()), b"bai").unwrap();
    for hap in HaplotypeLabel::BOTH {
        fs::write(paths.round1_probs(hap), b"hdf").unwrap();
        write_vcf(&paths.round1_calls(hap), 1);
    }
    write_vcf(&paths.merged(), 2);
    write_vcf(&paths.annotated(), 2);
    if config.filtering {
        write_vcf(&paths.filtered(), 2);
    }
    if config.phased_output {
        write_vcf(&paths.final_phased(), 2);
    } else {
        write_vcf(&paths.final_unphased(), 2);
    }
}

#[tokio::test]
async fn empty_round0_result_short_circuits() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let paths = populate_inputs_and_round0(&config, 0);

    let outcome = Driver::new(config, COMMAND_LINE).run().await.unwrap();

    assert_eq!(outcome.branch, OutcomeBranch::NoVariants);
    assert_eq!(outcome.final_vcf, paths.round0_unphased());
    // No phasing or round-1 artifacts appear.
    assert!(!paths.round0_phased().exists());
    assert!(!paths.round1_probs(HaplotypeLabel::Hap1).exists());
    assert!(!paths.merged().exists());
}

#[tokio::test]
async fn stop_after_round0_skips_phasing_and_round1() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.stop_after_round0 = true;
    config.sample_name = "patient_01".to_string();
    let paths = populate_inputs_and_round0(&config, 3);

    let outcome = Driver::new(config, COMMAND_LINE).run().await.unwrap();

    assert_eq!(outcome.branch, OutcomeBranch::Round0Only);
    assert_eq!(outcome.final_vcf, paths.round0_unphased());
    // The forwarded call set carries the configured sample name.
    let text = fs::read_to_string(&outcome.final_vcf).unwrap();
    assert!(text.contains("FORMAT\tpatient_01"));
    assert!(!paths.round0_phased().exists());
    assert!(!paths.round1_calls(HaplotypeLabel::Hap2).exists());
}

#[tokio::test]
async fn fully_populated_directory_resumes_without_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let paths = populate_inputs_and_round0(&config, 2);
    populate_completed_run(&config, &paths);

    let final_before = fs::read_to_string(paths.final_unphased()).unwrap();
    // Every external tool is absent from the test environment; the run
    // only succeeds if the caching gate skips all of them.
    let outcome = Driver::new(config, COMMAND_LINE).run().await.unwrap();

    assert_eq!(outcome.branch, OutcomeBranch::Completed);
    assert_eq!(outcome.final_vcf, paths.final_unphased());
    assert_eq!(
        fs::read_to_string(paths.final_unphased()).unwrap(),
        final_before
    );
}

#[tokio::test]
async fn phased_flag_selects_the_phased_terminal_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.phased_output = true;
    let paths = populate_inputs_and_round0(&config, 2);
    populate_completed_run(&config, &paths);

    let outcome = Driver::new(config, COMMAND_LINE).run().await.unwrap();

    assert_eq!(outcome.branch, OutcomeBranch::Completed);
    assert_eq!(outcome.final_vcf, paths.final_phased());
    assert!(!paths.final_unphased().exists());
}

#[tokio::test]
async fn disabled_filter_passes_the_merged_set_through() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.filtering = false;
    let paths = populate_inputs_and_round0(&config, 2);
    populate_completed_run(&config, &paths);

    let outcome = Driver::new(config, COMMAND_LINE).run().await.unwrap();

    assert_eq!(outcome.branch, OutcomeBranch::Completed);
    // The filter stage never touched the run: no filtered artifact.
    assert!(!paths.filtered().exists());
    assert_eq!(outcome.final_vcf, paths.final_unphased());
}

#[tokio::test]
async fn provenance_is_injected_once_into_the_annotated_set() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let paths = populate_inputs_and_round0(&config, 2);
    populate_completed_run(&config, &paths);
    // Force the annotation step to run from the merged set.
    fs::remove_file(paths.annotated()).unwrap();

    Driver::new(config, COMMAND_LINE).run().await.unwrap();

    let text = fs::read_to_string(paths.annotated()).unwrap();
    let provenance: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with("##hapflow_command="))
        .collect();
    assert_eq!(provenance.len(), 1);
    assert!(provenance[0].contains(COMMAND_LINE));
}

#[tokio::test]
async fn missing_input_aborts_before_any_stage() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    // Reference exists but the alignment does not.
    fs::write(&config.reference, b"fasta").unwrap();
    fs::write(artifact::fai(&config.reference), b"fai").unwrap();

    let err = Driver::new(config, COMMAND_LINE).run().await.unwrap_err();
    assert!(err.to_string().contains("reads.bam"));
}

#[tokio::test]
async fn delete_intermediates_keeps_the_final_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.delete_intermediates = true;
    let paths = populate_inputs_and_round0(&config, 2);
    populate_completed_run(&config, &paths);

    let outcome = Driver::new(config, COMMAND_LINE).run().await.unwrap();

    assert!(outcome.final_vcf.exists());
    assert!(!paths.round0_probs().exists());
    assert!(!paths.round0_tagged_rg().exists());
    assert!(!paths.round0_phased_gz().exists());
}
