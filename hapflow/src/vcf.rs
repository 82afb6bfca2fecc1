//! Structured edits over plain-text variant call files.
//!
//! The orchestrator touches call sets in exactly three ways: counting data
//! records to drive the empty-result branch, rewriting the sample name in
//! the column-header line, and injecting a provenance record. All three
//! parse the file's line structure (meta lines, the `#CHROM` column-header
//! line, data records) rather than patching text blindly, so a record that
//! happens to contain the placeholder sample name is never corrupted.
//! Edits land via a sibling temp file and an atomic rename.

use crate::errors::{HapflowError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the mandatory column-header line.
const COLUMN_HEADER_PREFIX: &str = "#CHROM";

/// Meta key of the provenance record this pipeline injects.
const PROVENANCE_KEY: &str = "##hapflow_command=";

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(str::to_owned).collect())
}

fn write_atomic(path: &Path, lines: &[String]) -> Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn column_header_index(path: &Path, lines: &[String]) -> Result<usize> {
    lines
        .iter()
        .position(|line| line.starts_with(COLUMN_HEADER_PREFIX))
        .ok_or_else(|| HapflowError::vcf(path, "missing #CHROM column header line"))
}

/// Counts data records (non-header, non-empty lines).
///
/// # Errors
///
/// Fails on IO errors or when the file has no column-header line.
pub fn count_records(path: &Path) -> Result<usize> {
    let lines = read_lines(path)?;
    column_header_index(path, &lines)?;
    Ok(lines
        .iter()
        .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
        .count())
}

/// Rewrites the first sample field of the column-header line in place.
///
/// Data records are untouched; only the header's sample column changes.
///
/// # Errors
///
/// Fails when the file has no column-header line or the header carries no
/// sample column.
pub fn rename_sample(path: &Path, sample: &str) -> Result<()> {
    let mut lines = read_lines(path)?;
    let idx = column_header_index(path, &lines)?;
    let mut fields: Vec<&str> = lines[idx].split('\t').collect();
    if fields.len() < 10 {
        return Err(HapflowError::vcf(
            path,
            format!(
                "column header has {} fields, expected FORMAT plus a sample column",
                fields.len()
            ),
        ));
    }
    fields[9] = sample;
    let header = fields.join("\t");
    lines[idx] = header;
    write_atomic(path, &lines)
}

/// Writes a copy of `input` to `output` with one provenance meta line
/// (the invoking command line and a timestamp) inserted immediately
/// before the column-header line.
///
/// # Errors
///
/// Fails when the input has no column-header line.
pub fn inject_provenance(
    input: &Path,
    output: &Path,
    command_line: &str,
    timestamp: &str,
) -> Result<()> {
    let mut lines = read_lines(input)?;
    let idx = column_header_index(input, &lines)?;
    lines.insert(idx, format!("{PROVENANCE_KEY}{command_line}; Date={timestamp}"));
    write_atomic(output, &lines)
}
