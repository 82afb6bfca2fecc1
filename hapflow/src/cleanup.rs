//! Post-terminal deletion of intermediate artifacts.

use crate::errors::Result;
use std::fs;
use std::path::Path;

/// Extension classes that identify intermediates: probability files,
/// alignment files and their indexes, compressed/indexed call sets.
const INTERMEDIATE_SUFFIXES: [&str; 5] = [".hdf", ".bam", ".bam.bai", ".vcf.gz", ".vcf.gz.tbi"];

/// Deletes intermediate artifacts from the output directory.
///
/// Runs only after the pipeline outcome is final and never deletes the
/// final artifact. Returns the number of files removed.
///
/// # Errors
///
/// Fails on IO errors while listing or removing files.
pub fn remove_intermediates(out_dir: &Path, final_artifact: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(out_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() || path == final_artifact {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if INTERMEDIATE_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            tracing::debug!(path = %path.display(), "removing intermediate");
            fs::remove_file(&path)?;
            removed += 1;
        }
    }
    tracing::info!(removed, "cleanup complete");
    Ok(removed)
}
