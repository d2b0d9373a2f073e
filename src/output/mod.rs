//! Output writers and file readers.
//!
//! This module handles moving data between disk and the library:
//! - JSON group reports (pretty)
//! - JSON crash submissions

pub mod json;

// Re-export main functions
pub use json::{read_group_report, read_submission, write_group_report};
