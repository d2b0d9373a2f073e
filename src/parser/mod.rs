//! Crash log parsing and data model definitions.
//!
//! This module handles:
//! - Isolating the crashed thread from raw log text
//! - Picking the first application frame
//! - Decoding that frame into a grouping signature
//! - Defining crash and group records

pub mod app_info;
pub mod frame;
pub mod pattern;
pub mod schema;
pub mod signature;
pub mod thread_block;

// Re-export main types
pub use app_info::{extract_app_info, is_jailbroken};
pub use frame::{select_frame, SelectedFrame};
pub use pattern::{build_pattern, decompose_pattern, PatternParts};
pub use schema::{CrashReport, CrashSubmission, Group, GroupId, GroupKey, UNGROUPED};
pub use signature::{extract_signature, MissReason, Signature, SignatureOutcome};
pub use thread_block::{extract_crashed_thread, extract_thread_blocks, BlockKind, ThreadBlock};
