//! The immutable run configuration.
//!
//! Constructed once from the command line, validated before any side
//! effect, then passed by reference to every stage and component. There is
//! no other run-scoped state.

use crate::errors::{HapflowError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Immutable parameters of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Input alignment of reads to the reference.
    pub alignment: PathBuf,
    /// Reference sequence.
    pub reference: PathBuf,
    /// Regions to restrict calling to; empty means all contigs.
    pub regions: Vec<String>,
    /// Directory receiving every artifact.
    pub output_dir: PathBuf,
    /// Model for the round-0 mixed-sample SNP calling pass; `None` uses
    /// the caller's default.
    pub snp_model: Option<String>,
    /// Model for the round-1 final variant calling pass; `None` uses the
    /// caller's default.
    pub variant_model: Option<String>,
    /// Worker threads handed to the external tools.
    pub threads: usize,
    /// Inference batch size (memory/throughput tradeoff).
    pub batch_size: usize,
    /// Phase the final output instead of stripping phasing.
    pub phased_output: bool,
    /// Delete intermediate artifacts after the outcome is final.
    pub delete_intermediates: bool,
    /// Quality strictly required of non-substitution records.
    pub indel_threshold: f64,
    /// Quality strictly required of substitution records.
    pub snp_threshold: f64,
    /// Apply the soft quality filter to the merged call set.
    pub filtering: bool,
    /// Finish after round 0, skipping phasing and round 1.
    pub stop_after_round0: bool,
    /// Split multi-nucleotide variants when merging haplotypes.
    pub split_mnv: bool,
    /// Sample name written into the output call sets.
    pub sample_name: String,
}

impl RunConfig {
    /// Checks the configuration before the run takes any side effect.
    ///
    /// # Errors
    ///
    /// Returns a validation error for zero thread counts or batch sizes,
    /// negative thresholds, an empty sample name, or blank region strings.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(HapflowError::validation("thread count must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(HapflowError::validation("batch size must be at least 1"));
        }
        if self.snp_threshold < 0.0 || self.indel_threshold < 0.0 {
            return Err(HapflowError::validation(
                "quality thresholds cannot be negative",
            ));
        }
        if self.sample_name.trim().is_empty() {
            return Err(HapflowError::validation("sample name cannot be empty"));
        }
        if self.regions.iter().any(|r| r.trim().is_empty()) {
            return Err(HapflowError::validation("region strings cannot be blank"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path) -> RunConfig {
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

    #[test]
    fn default_shaped_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        assert!(test_config(dir.path()).validate().is_ok());
    }

    #[test]
    fn zero_threads_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_thresholds_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.snp_threshold = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_region_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.regions = vec!["chr20".to_string(), "  ".to_string()];
        assert!(config.validate().is_err());
    }
}
