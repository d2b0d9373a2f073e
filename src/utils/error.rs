//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while reading or writing the store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(
        "Found {count} groups for bundle '{bundle_identifier}' version '{affected_version}' pattern '{pattern}'"
    )]
    DuplicateGroup {
        bundle_identifier: String,
        affected_version: String,
        pattern: String,
        count: usize,
    },

    #[error("Crash not found: {0}")]
    CrashNotFound(i64),

    #[error("Group not found: {0}")]
    GroupNotFound(i64),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("Cannot create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while validating an incoming crash submission
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field '{field}' contains characters that are not allowed: {value}")]
    InvalidCharacters { field: &'static str, value: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
