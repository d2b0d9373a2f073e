//! JSON file reading and writing.
//!
//! Writes group reports to JSON files with proper formatting and reads
//! crash submissions from JSON files.

use crate::aggregator::GroupReport;
use crate::parser::schema::CrashSubmission;
use crate::utils::error::{OutputError, SubmissionError};
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write a group report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report to write
/// * `output_path` - Path to output JSON file
///
/// # Returns
/// Ok if file written successfully
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_group_report(
    report: &GroupReport,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing group report to: {}", output_path.display());

    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, report).map_err(OutputError::SerializationFailed)?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Read a group report back from a JSON file
///
/// **Public** - useful for validation and testing
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_group_report(input_path: impl AsRef<Path>) -> Result<GroupReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading group report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: GroupReport =
        serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} {}",
        report.version, report.bundle_identifier, report.affected_version
    );

    Ok(report)
}

/// Read and validate a crash submission from a JSON file
///
/// **Public** - input of the ingest command
///
/// # Errors
/// * `SubmissionError::IoError` - File read error
/// * `SubmissionError::JsonError` - Not a valid submission document
/// * Validation errors from `CrashSubmission::validate`
pub fn read_submission(input_path: impl AsRef<Path>) -> Result<CrashSubmission, SubmissionError> {
    let input_path = input_path.as_ref();

    debug!("Reading submission from: {}", input_path.display());

    let file = File::open(input_path)?;
    let submission: CrashSubmission = serde_json::from_reader(BufReader::new(file))?;
    submission.validate()?;

    Ok(submission)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
