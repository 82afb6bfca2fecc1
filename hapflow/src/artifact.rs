//! Filesystem-backed artifacts and the naming scheme that keys the cache.
//!
//! An artifact is a named file on disk, optionally paired with a companion
//! index that must exist before the artifact counts as present. Presence is
//! the caching key: a stage whose declared outputs are all present is
//! skipped. Naming embeds the round marker and haplotype label so that
//! resumption is unambiguous and the two haplotype branches never write to
//! the same path.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Appends an extra extension to a path (`reads.bam` -> `reads.bam.bai`).
fn with_companion_ext(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Companion positional index of an alignment file.
#[must_use]
pub fn bai(path: &Path) -> PathBuf {
    with_companion_ext(path, "bai")
}

/// Companion sequence index of a reference file.
#[must_use]
pub fn fai(path: &Path) -> PathBuf {
    with_companion_ext(path, "fai")
}

/// Companion index of a compressed variant call file.
#[must_use]
pub fn tbi(path: &Path) -> PathBuf {
    with_companion_ext(path, "tbi")
}

/// A named file on disk plus its implicit index requirement.
///
/// Identity is the path. Once present, an artifact is treated as immutable
/// and reusable for the remainder of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// The artifact's path.
    pub path: PathBuf,
    /// Companion index that must accompany the file, if any.
    pub index: Option<PathBuf>,
}

impl Artifact {
    /// An artifact with no companion index.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            index: None,
        }
    }

    /// An alignment artifact; requires its positional index.
    #[must_use]
    pub fn alignment(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let index = Some(bai(&path));
        Self { path, index }
    }

    /// A reference sequence artifact; requires its sequence index.
    #[must_use]
    pub fn reference(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let index = Some(fai(&path));
        Self { path, index }
    }

    /// A compressed variant call artifact; requires its index.
    #[must_use]
    pub fn indexed_calls(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let index = Some(tbi(&path));
        Self { path, index }
    }

    /// True when the file and its companion index (if required) both exist.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.first_missing().is_none()
    }

    /// The first path that prevents this artifact from being present.
    #[must_use]
    pub fn first_missing(&self) -> Option<PathBuf> {
        if !self.path.exists() {
            return Some(self.path.clone());
        }
        match &self.index {
            Some(index) if !index.exists() => Some(index.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// One of the two haplotypes of a diploid sample.
///
/// Parameterizes the round-1 stages and their artifact names. The two
/// branches are siblings: same read-only inputs, disjoint outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HaplotypeLabel {
    /// Haplotype 1.
    Hap1,
    /// Haplotype 2.
    Hap2,
}

impl HaplotypeLabel {
    /// Both haplotypes, in label order.
    pub const BOTH: [Self; 2] = [Self::Hap1, Self::Hap2];

    /// The value carried by the haplotype read tag.
    #[must_use]
    pub fn tag_value(self) -> &'static str {
        match self {
            Self::Hap1 => "1",
            Self::Hap2 => "2",
        }
    }
}

impl fmt::Display for HaplotypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag_value())
    }
}

/// The single source of every artifact path a run can produce.
///
/// Intermediate names follow `round_<round>_hap_<label>_<kind>.<ext>`;
/// the mixed round-0 pass uses the label `mixed`.
#[derive(Debug, Clone, Serialize)]
pub struct RunPaths {
    out_dir: PathBuf,
}

impl RunPaths {
    /// Creates the path scheme rooted at the output directory.
    #[must_use]
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// The output directory itself.
    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn join(&self, name: &str) -> PathBuf {
        self.out_dir.join(name)
    }

    /// Region-clipped copy of the input alignment.
    #[must_use]
    pub fn region_alignment(&self) -> PathBuf {
        self.join("input_region.bam")
    }

    /// Round-0 consensus probabilities over the mixed sample.
    #[must_use]
    pub fn round0_probs(&self) -> PathBuf {
        self.join("round_0_hap_mixed_probs.hdf")
    }

    /// Round-0 unphased SNP call set.
    #[must_use]
    pub fn round0_unphased(&self) -> PathBuf {
        self.join("round_0_hap_mixed_unphased.vcf")
    }

    /// Round-0 phased call set.
    #[must_use]
    pub fn round0_phased(&self) -> PathBuf {
        self.join("round_0_hap_mixed_phased.vcf")
    }

    /// Compressed round-0 phased call set.
    #[must_use]
    pub fn round0_phased_gz(&self) -> PathBuf {
        self.join("round_0_hap_mixed_phased.vcf.gz")
    }

    /// Haplotag-annotated alignment.
    #[must_use]
    pub fn round0_tagged(&self) -> PathBuf {
        self.join("round_0_hap_mixed_tagged.bam")
    }

    /// Haplotag-annotated alignment with the replacement read group.
    #[must_use]
    pub fn round0_tagged_rg(&self) -> PathBuf {
        self.join("round_0_hap_mixed_tagged_rg.bam")
    }

    /// Round-1 consensus probabilities for one haplotype.
    #[must_use]
    pub fn round1_probs(&self, hap: HaplotypeLabel) -> PathBuf {
        self.join(&format!("round_1_hap_{hap}_probs.hdf"))
    }

    /// Round-1 haploid call set for one haplotype.
    #[must_use]
    pub fn round1_calls(&self, hap: HaplotypeLabel) -> PathBuf {
        self.join(&format!("round_1_hap_{hap}_calls.vcf"))
    }

    /// Diploid merge of the two haploid call sets.
    #[must_use]
    pub fn merged(&self) -> PathBuf {
        self.join("round_1_merged.vcf")
    }

    /// Merged call set with provenance header and sample name applied.
    #[must_use]
    pub fn annotated(&self) -> PathBuf {
        self.join("round_1_annotated.vcf")
    }

    /// Quality-filtered call set.
    #[must_use]
    pub fn filtered(&self) -> PathBuf {
        self.join("round_1_filtered.vcf")
    }

    /// Terminal artifact when phased output was requested.
    #[must_use]
    pub fn final_phased(&self) -> PathBuf {
        self.join("round_1_phased.vcf")
    }

    /// Terminal artifact in the canonical unphased schema.
    #[must_use]
    pub fn final_unphased(&self) -> PathBuf {
        self.join("round_1_unphased.vcf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn companion_extensions_append() {
        assert_eq!(
            bai(Path::new("/out/reads.bam")),
            PathBuf::from("/out/reads.bam.bai")
        );
        assert_eq!(
            fai(Path::new("/data/ref.fasta")),
            PathBuf::from("/data/ref.fasta.fai")
        );
        assert_eq!(
            tbi(Path::new("/out/calls.vcf.gz")),
            PathBuf::from("/out/calls.vcf.gz.tbi")
        );
    }

    #[test]
    fn plain_file_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probs.hdf");
        let artifact = Artifact::file(&path);

        assert!(!artifact.is_present());
        assert_eq!(artifact.first_missing(), Some(path.clone()));

        fs::write(&path, b"x").unwrap();
        assert!(artifact.is_present());
    }

    #[test]
    fn alignment_requires_index() {
        let dir = tempfile::tempdir().unwrap();
        let bam = dir.path().join("reads.bam");
        fs::write(&bam, b"x").unwrap();

        let artifact = Artifact::alignment(&bam);
        assert!(!artifact.is_present());
        assert_eq!(artifact.first_missing(), Some(bai(&bam)));

        fs::write(bai(&bam), b"x").unwrap();
        assert!(artifact.is_present());
    }

    #[test]
    fn naming_scheme_embeds_round_and_haplotype() {
        let paths = RunPaths::new("/out");
        assert_eq!(
            paths.round0_unphased(),
            PathBuf::from("/out/round_0_hap_mixed_unphased.vcf")
        );
        assert_eq!(
            paths.round1_probs(HaplotypeLabel::Hap1),
            PathBuf::from("/out/round_1_hap_1_probs.hdf")
        );
        assert_eq!(
            paths.round1_calls(HaplotypeLabel::Hap2),
            PathBuf::from("/out/round_1_hap_2_calls.vcf")
        );
    }

    #[test]
    fn haplotype_branches_write_disjoint_paths() {
        let paths = RunPaths::new("/out");
        assert_ne!(
            paths.round1_probs(HaplotypeLabel::Hap1),
            paths.round1_probs(HaplotypeLabel::Hap2)
        );
        assert_ne!(
            paths.round1_calls(HaplotypeLabel::Hap1),
            paths.round1_calls(HaplotypeLabel::Hap2)
        );
    }
}
