//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod groups;
pub mod ingest;
pub mod models;
pub mod regroup;

// Re-export main command functions
pub use groups::{execute_annotate, execute_groups, execute_signature, execute_version_status};
pub use ingest::execute_ingest;
pub use models::{IngestOutcome, RegroupScope, RegroupSummary, RejectReason, SubmissionStatus};
pub use regroup::{execute_regroup, execute_update_log};
