//! Command-line surface.
//!
//! Parsing produces a [`RunConfig`]; nothing else in the crate looks at
//! the process arguments.

use crate::config::RunConfig;
use clap::Parser;
use std::path::PathBuf;

/// Haplotype-aware two-round variant calling pipeline.
///
/// Runs a mixed-sample discovery pass, phases and haplotags the
/// alignment, re-calls each haplotype separately, and merges the result
/// into a diploid call set.
#[derive(Parser, Debug)]
#[command(name = "hapflow", version, about)]
pub struct Cli {
    /// Input alignment of reads to the reference (BAM).
    #[arg(short = 'i', value_name = "BAM")]
    pub alignment: PathBuf,

    /// Reference sequence (FASTA).
    #[arg(short = 'f', value_name = "FASTA")]
    pub reference: PathBuf,

    /// Region string(s) to restrict calling to (default: all contigs).
    #[arg(short = 'r', value_name = "REGION", num_args = 1..)]
    pub regions: Vec<String>,

    /// Output directory.
    #[arg(short = 'o', value_name = "DIR", default_value = "medaka_variant")]
    pub output_dir: PathBuf,

    /// Model for round-0 mixed-sample SNP calling (default: tool default).
    #[arg(short = 's', value_name = "MODEL")]
    pub snp_model: Option<String>,

    /// Model for round-1 final variant calling (default: tool default).
    #[arg(short = 'm', value_name = "MODEL")]
    pub variant_model: Option<String>,

    /// Worker thread count for external tools.
    #[arg(short = 't', value_name = "N", default_value_t = 1)]
    pub threads: usize,

    /// Request phased final output.
    #[arg(short = 'p')]
    pub phased: bool,

    /// Inference batch size (memory/throughput tradeoff).
    #[arg(short = 'b', value_name = "N", default_value_t = 100)]
    pub batch_size: usize,

    /// Delete intermediate artifacts on completion.
    #[arg(short = 'd')]
    pub delete_intermediates: bool,

    /// Quality threshold for non-substitution records (strictly greater
    /// than to pass).
    #[arg(short = 'N', value_name = "QUAL", default_value_t = 9.0)]
    pub indel_threshold: f64,

    /// Quality threshold for substitution records (strictly greater than
    /// to pass).
    #[arg(short = 'P', value_name = "QUAL", default_value_t = 8.0)]
    pub snp_threshold: f64,

    /// Disable quality filtering.
    #[arg(short = 'U')]
    pub unfiltered: bool,

    /// Stop after round 0, skipping phasing and round 1.
    #[arg(short = 'S')]
    pub stop_after_round0: bool,

    /// Split multi-nucleotide variants when merging haplotypes.
    #[arg(short = 'l')]
    pub split_mnv: bool,

    /// Sample name written into the output.
    #[arg(short = 'n', value_name = "NAME", default_value = "SAMPLE")]
    pub sample_name: String,
}

impl Cli {
    /// Converts the parsed arguments into the immutable run configuration.
    #[must_use]
    pub fn into_config(self) -> RunConfig {
        RunConfig {
            alignment: self.alignment,
            reference: self.reference,
            regions: self.regions,
            output_dir: self.output_dir,
            snp_model: self.snp_model,
            variant_model: self.variant_model,
            threads: self.threads,
            batch_size: self.batch_size,
            phased_output: self.phased,
            delete_intermediates: self.delete_intermediates,
            indel_threshold: self.indel_threshold,
            snp_threshold: self.snp_threshold,
            filtering: !self.unfiltered,
            stop_after_round0: self.stop_after_round0,
            split_mnv: self.split_mnv,
            sample_name: self.sample_name,
        }
    }
}
