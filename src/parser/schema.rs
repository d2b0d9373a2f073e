//! Crash and group data model.
//!
//! `CrashSubmission` is what arrives at the boundary, `CrashReport` is what
//! gets persisted, and `Group` is the shared aggregate a report points to.

use crate::utils::error::SubmissionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a persisted group
pub type GroupId = i64;

/// Sentinel group id for crashes without a signature
pub const UNGROUPED: GroupId = 0;

/// A crash as delivered by a client, after envelope parsing
///
/// **Public** - input to the ingest command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashSubmission {
    pub bundle_identifier: String,

    /// Display name of the application, used as the primary frame matcher
    pub application_name: String,

    /// Application version the crash happened in
    #[serde(alias = "version")]
    pub affected_version: String,

    #[serde(default)]
    pub system_version: String,

    #[serde(default)]
    pub platform: String,

    /// Raw crash log text
    #[serde(alias = "log")]
    pub log_text: String,

    /// When the crash was received (defaults to now)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl CrashSubmission {
    /// Validate required fields and version formatting
    ///
    /// **Public** - called by the submission reader and by ingest
    ///
    /// # Errors
    /// * `SubmissionError::MissingField` - a required field is blank
    /// * `SubmissionError::InvalidCharacters` - version contains disallowed characters
    pub fn validate(&self) -> Result<(), SubmissionError> {
        if self.bundle_identifier.trim().is_empty() {
            return Err(SubmissionError::MissingField("bundle_identifier"));
        }
        if self.application_name.trim().is_empty() {
            return Err(SubmissionError::MissingField("application_name"));
        }
        if self.affected_version.trim().is_empty() {
            return Err(SubmissionError::MissingField("affected_version"));
        }
        if self.log_text.trim().is_empty() {
            return Err(SubmissionError::MissingField("log_text"));
        }
        if !is_version_text(&self.affected_version) {
            return Err(SubmissionError::InvalidCharacters {
                field: "affected_version",
                value: self.affected_version.clone(),
            });
        }
        Ok(())
    }
}

/// Versions may contain letters, digits, whitespace and plain punctuation
fn is_version_text(value: &str) -> bool {
    value.chars().all(|c| {
        c.is_ascii_alphanumeric()
            || c.is_whitespace()
            || matches!(c, '.' | ',' | ';' | ':' | '&' | '"' | '\'' | '?' | '!' | '(' | ')')
    })
}

/// A persisted crash report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashReport {
    pub id: i64,
    pub bundle_identifier: String,
    pub application_name: String,
    pub affected_version: String,
    pub system_version: String,
    pub platform: String,
    pub log_text: String,
    pub timestamp: DateTime<Utc>,

    /// Group this crash belongs to (`UNGROUPED` if none)
    pub group_id: GroupId,

    pub jailbreak: bool,
}

impl CrashReport {
    /// Build an unsaved report from a validated submission
    pub fn from_submission(submission: &CrashSubmission) -> Self {
        Self {
            id: 0,
            bundle_identifier: submission.bundle_identifier.clone(),
            application_name: submission.application_name.clone(),
            affected_version: submission.affected_version.clone(),
            system_version: submission.system_version.clone(),
            platform: submission.platform.clone(),
            log_text: submission.log_text.clone(),
            timestamp: submission.timestamp,
            group_id: UNGROUPED,
            jailbreak: super::app_info::is_jailbroken(&submission.log_text),
        }
    }

    /// Key of the group this crash would join for the given pattern
    pub fn group_key(&self, pattern: &str) -> GroupKey {
        GroupKey {
            bundle_identifier: self.bundle_identifier.clone(),
            affected_version: self.affected_version.clone(),
            pattern: pattern.to_string(),
        }
    }
}

/// Aggregate of crashes sharing a signature within one app version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub bundle_identifier: String,
    pub affected_version: String,

    /// Signature shared by every member crash
    pub pattern: String,

    /// Number of member crashes
    pub amount: u32,

    /// Newest member timestamp
    pub latest_timestamp: Option<DateTime<Utc>>,

    /// Version that fixes this crash (empty if unassigned)
    pub fix_version: String,

    pub description: String,
}

/// Unique lookup key of a group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub bundle_identifier: String,
    pub affected_version: String,
    pub pattern: String,
}
