//! Command templates for the external collaborators.
//!
//! The orchestrator never parses alignment or variant formats beyond the
//! plain-text header edits in [`crate::vcf`]; everything heavy is a
//! subprocess built here: the neural caller, the phasing/haplotagging
//! engine, alignment and sequence indexing, compression, and the record
//! filter evaluator.

use crate::artifact::HaplotypeLabel;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// An external command: a program and its argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
    program: String,
    args: Vec<String>,
}

impl ToolCommand {
    /// Creates a command for the given program.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a path argument.
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The program to invoke.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument vector.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Subcommands of the neural-network caller.
pub mod medaka {
    use super::{HaplotypeLabel, Path, ToolCommand};

    /// Generates a consensus probability artifact from an alignment.
    ///
    /// With a haplotype label, processing is restricted to reads carrying
    /// that haplotype tag; untagged reads are kept so unassigned reads are
    /// not discarded.
    #[must_use]
    pub fn consensus(
        alignment: &Path,
        probs: &Path,
        model: Option<&str>,
        threads: usize,
        batch_size: usize,
        haplotype: Option<HaplotypeLabel>,
    ) -> ToolCommand {
        let mut cmd = ToolCommand::new("medaka")
            .arg("consensus")
            .path_arg(alignment)
            .path_arg(probs)
            .args(["--threads".to_string(), threads.to_string()])
            .args(["--batch_size".to_string(), batch_size.to_string()]);
        if let Some(model) = model {
            cmd = cmd.args(["--model", model]);
        }
        if let Some(hap) = haplotype {
            cmd = cmd
                .args(["--tag_name", "HP"])
                .args(["--tag_value", hap.tag_value()])
                .arg("--tag_keep_missing");
        }
        cmd
    }

    /// Derives an unphased SNP call set from consensus probabilities.
    #[must_use]
    pub fn snp(reference: &Path, probs: &Path, calls: &Path) -> ToolCommand {
        ToolCommand::new("medaka")
            .arg("snp")
            .path_arg(reference)
            .path_arg(probs)
            .path_arg(calls)
    }

    /// Derives a haploid call set in genomic-VCF form from probabilities.
    #[must_use]
    pub fn variant(reference: &Path, probs: &Path, calls: &Path) -> ToolCommand {
        ToolCommand::new("medaka")
            .arg("variant")
            .arg("--gvcf")
            .path_arg(reference)
            .path_arg(probs)
            .path_arg(calls)
    }

    /// Combines two haploid call sets into one diploid call set.
    #[must_use]
    pub fn haploid2diploid(
        hap1_calls: &Path,
        hap2_calls: &Path,
        reference: &Path,
        merged: &Path,
        split_mnv: bool,
    ) -> ToolCommand {
        let mut cmd = ToolCommand::new("medaka")
            .arg("tools")
            .arg("haploid2diploid")
            .path_arg(hap1_calls)
            .path_arg(hap2_calls)
            .path_arg(reference)
            .path_arg(merged);
        if split_mnv {
            cmd = cmd.arg("--split_mnp");
        }
        cmd
    }
}

/// The phasing and haplotagging engine.
pub mod whatshap {
    use super::{Path, ToolCommand};

    /// Phases a call set against the alignment and reference.
    #[must_use]
    pub fn phase(calls: &Path, phased: &Path, reference: &Path, alignment: &Path) -> ToolCommand {
        ToolCommand::new("whatshap")
            .arg("phase")
            .arg("-o")
            .path_arg(phased)
            .arg("--reference")
            .path_arg(reference)
            .arg("--distrust-genotypes")
            .arg("--ignore-read-groups")
            .path_arg(calls)
            .path_arg(alignment)
    }

    /// Annotates reads with the haplotype they most likely belong to.
    #[must_use]
    pub fn haplotag(
        phased_calls: &Path,
        alignment: &Path,
        reference: &Path,
        tagged: &Path,
    ) -> ToolCommand {
        ToolCommand::new("whatshap")
            .arg("haplotag")
            .arg("-o")
            .path_arg(tagged)
            .arg("--reference")
            .path_arg(reference)
            .arg("--ignore-read-groups")
            .path_arg(phased_calls)
            .path_arg(alignment)
    }

    /// Strips phasing information, yielding the canonical unphased schema.
    #[must_use]
    pub fn unphase(calls: &Path, unphased: &Path) -> ToolCommand {
        ToolCommand::new("whatshap")
            .arg("unphase")
            .arg("-o")
            .path_arg(unphased)
            .path_arg(calls)
    }
}

/// Alignment plumbing: region clipping, indexing, read-group rewriting.
pub mod samtools {
    use super::{Path, ToolCommand};

    /// Clips an alignment down to the requested regions.
    #[must_use]
    pub fn view_regions(alignment: &Path, clipped: &Path, regions: &[String]) -> ToolCommand {
        ToolCommand::new("samtools")
            .arg("view")
            .arg("-b")
            .arg("-o")
            .path_arg(clipped)
            .path_arg(alignment)
            .args(regions.iter().cloned())
    }

    /// Builds the positional index of an alignment.
    #[must_use]
    pub fn index(alignment: &Path) -> ToolCommand {
        ToolCommand::new("samtools").arg("index").path_arg(alignment)
    }

    /// Builds the sequence index of a reference.
    #[must_use]
    pub fn faidx(reference: &Path) -> ToolCommand {
        ToolCommand::new("samtools").arg("faidx").path_arg(reference)
    }

    /// Replaces the read group, rewriting the sample tag.
    #[must_use]
    pub fn replace_read_group(alignment: &Path, rewritten: &Path, sample: &str) -> ToolCommand {
        ToolCommand::new("samtools")
            .arg("addreplacerg")
            .arg("-r")
            .arg(format!("ID:hapflow\tSM:{sample}"))
            .arg("-o")
            .path_arg(rewritten)
            .path_arg(alignment)
    }
}

/// Compression and variant-file indexing.
pub mod htsfile {
    use super::{Path, ToolCommand};

    /// Block-compresses a call set, keeping the original.
    #[must_use]
    pub fn bgzip(calls: &Path) -> ToolCommand {
        ToolCommand::new("bgzip").arg("-kf").path_arg(calls)
    }

    /// Indexes a compressed call set.
    #[must_use]
    pub fn tabix(compressed_calls: &Path) -> ToolCommand {
        ToolCommand::new("tabix")
            .arg("-f")
            .arg("-p")
            .arg("vcf")
            .path_arg(compressed_calls)
    }
}

/// The record filter expression evaluator.
pub mod bcftools {
    use super::{Path, ToolCommand};

    /// Expression matching records that fail the quality thresholds.
    ///
    /// A substitution (single- or multi-nucleotide) passes only with
    /// quality strictly greater than the SNP threshold; every other
    /// variant type passes only with quality strictly greater than the
    /// indel threshold.
    #[must_use]
    pub fn fail_expression(snp_threshold: f64, indel_threshold: f64) -> String {
        format!(
            "((TYPE=\"snp\" || TYPE=\"mnp\") && QUAL<={snp_threshold}) || \
             (TYPE!=\"snp\" && TYPE!=\"mnp\" && QUAL<={indel_threshold})"
        )
    }

    /// Soft-tags failing records as `lowqual` instead of removing them,
    /// preserving all calls for downstream re-filtering.
    #[must_use]
    pub fn soft_filter(
        calls: &Path,
        filtered: &Path,
        snp_threshold: f64,
        indel_threshold: f64,
    ) -> ToolCommand {
        ToolCommand::new("bcftools")
            .arg("filter")
            .arg("-m+")
            .arg("-s")
            .arg("lowqual")
            .arg("-e")
            .arg(fail_expression(snp_threshold, indel_threshold))
            .arg("-o")
            .path_arg(filtered)
            .path_arg(calls)
    }
}
