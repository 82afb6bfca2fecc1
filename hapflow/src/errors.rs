//! Error types for the hapflow pipeline.
//!
//! Every error is fatal to the run: nothing is caught and retried
//! internally. Recovery is manual: rerunning against the same output
//! directory resumes from the artifacts already on disk.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HapflowError>;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum HapflowError {
    /// The run configuration was rejected before any side effect.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// A stage was about to run but a required input (or its companion
    /// index) is absent.
    #[error("stage '{stage}' requires '{}' which does not exist", .path.display())]
    MissingArtifact {
        /// The stage that needed the file.
        stage: String,
        /// The specific missing path.
        path: PathBuf,
    },

    /// An external tool exited nonzero. Partial outputs are left on disk
    /// for inspection.
    #[error("stage '{stage}' failed: `{command}` exited with {status}")]
    ToolExecution {
        /// The failing stage's name.
        stage: String,
        /// The rendered command line.
        command: String,
        /// The process exit status.
        status: ExitStatus,
    },

    /// The stage dependency graph is malformed or cannot make progress.
    #[error("pipeline graph error: {0}")]
    Graph(String),

    /// A variant call file did not have the expected structure.
    #[error("malformed variant file '{}': {reason}", .path.display())]
    Vcf {
        /// The offending file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HapflowError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a missing-artifact error.
    #[must_use]
    pub fn missing_artifact(stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact {
            stage: stage.into(),
            path: path.into(),
        }
    }

    /// Creates a malformed-VCF error.
    #[must_use]
    pub fn vcf(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Vcf {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_artifact_names_the_path() {
        let err = HapflowError::missing_artifact("phase_round0", "/data/ref.fasta.fai");
        assert!(err.to_string().contains("phase_round0"));
        assert!(err.to_string().contains("/data/ref.fasta.fai"));
    }

    #[test]
    fn vcf_error_names_the_file() {
        let err = HapflowError::vcf("/out/round_1_merged.vcf", "missing #CHROM column header line");
        assert!(err.to_string().contains("round_1_merged.vcf"));
        assert!(err.to_string().contains("#CHROM"));
    }
}
