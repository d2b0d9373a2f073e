//! Aggregation of crashes into groups.
//!
//! This module turns signatures into persisted groups:
//! - Group resolution (find or create, count, regroup)
//! - Description merging from crash information
//! - Per-version group reports

pub mod description;
pub mod report;
pub mod resolver;

// Re-export main types and functions
pub use description::{merge_description, seed_description, MergeOutcome};
pub use report::{build_group_report, ClassSummary, GroupEntry, GroupReport, MethodSummary};
pub use resolver::{group_crash, resolve_group, GroupingOutcome, Resolution};
