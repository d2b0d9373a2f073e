use crate::parser::schema::{GroupId, UNGROUPED};
use crate::parser::signature::MissReason;
use crate::store::CrashFilter;
use serde::Serialize;
use std::fmt;

/// Answer returned to the submitting client
///
/// **Public** - result of every ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionStatus {
    /// The crash was not stored
    Rejected,
    /// Stored; no fix is known for its group
    AcceptedUnknown,
    /// Stored; the fix version is already available
    AcceptedKnownGood,
    /// Stored; a fix is assigned but not yet available
    AcceptedKnownBad,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::AcceptedUnknown => "accepted-unknown",
            SubmissionStatus::AcceptedKnownGood => "accepted-known-good",
            SubmissionStatus::AcceptedKnownBad => "accepted-known-bad",
        };
        f.write_str(text)
    }
}

/// Why a submission was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    AppNotAccepted,
    VersionDiscontinued,
}

/// Result of the ingest command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub status: SubmissionStatus,

    /// Id of the stored crash (`None` when rejected)
    pub crash_id: Option<i64>,

    /// Group the crash joined (`UNGROUPED` if none)
    pub group_id: GroupId,

    /// The crash opened a new group
    pub created_group: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reject_reason: Option<RejectReason>,

    /// Why no signature was found, if grouping ran and missed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miss: Option<String>,
}

impl IngestOutcome {
    pub(crate) fn rejected(reason: RejectReason) -> Self {
        Self {
            status: SubmissionStatus::Rejected,
            crash_id: None,
            group_id: UNGROUPED,
            created_group: false,
            reject_reason: Some(reason),
            miss: None,
        }
    }

    pub(crate) fn miss_reason(miss: Option<MissReason>) -> Option<String> {
        miss.map(|reason| reason.to_string())
    }
}

/// Which crashes a regroup touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegroupScope {
    /// A single crash
    Crash(i64),
    /// Every crash currently in one group (`UNGROUPED` selects the leftovers)
    Group {
        bundle_identifier: String,
        affected_version: String,
        group_id: GroupId,
    },
    /// Every crash of one application version
    Version {
        bundle_identifier: String,
        affected_version: String,
    },
    /// Every crash of one application
    Bundle(String),
}

impl RegroupScope {
    /// Store filter for batch scopes; `None` for a single crash
    pub fn filter(&self) -> Option<CrashFilter> {
        match self {
            RegroupScope::Crash(_) => None,
            RegroupScope::Group {
                bundle_identifier,
                affected_version,
                group_id,
            } => Some(CrashFilter {
                bundle_identifier: Some(bundle_identifier.clone()),
                affected_version: Some(affected_version.clone()),
                group_id: Some(*group_id),
            }),
            RegroupScope::Version {
                bundle_identifier,
                affected_version,
            } => Some(CrashFilter {
                bundle_identifier: Some(bundle_identifier.clone()),
                affected_version: Some(affected_version.clone()),
                group_id: None,
            }),
            RegroupScope::Bundle(bundle_identifier) => Some(CrashFilter {
                bundle_identifier: Some(bundle_identifier.clone()),
                ..Default::default()
            }),
        }
    }
}

/// Tally of a regroup run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegroupSummary {
    /// Crashes looked at
    pub examined: usize,
    /// Crashes that changed groups
    pub moved: usize,
    /// Crashes that stayed where they were
    pub unchanged: usize,
    /// Crashes left without a group afterwards
    pub ungrouped: usize,
    /// Crashes skipped because grouping is disabled for their app
    pub skipped: usize,
    /// Groups created during the run
    pub created_groups: usize,
    /// Crashes newly flagged as jailbroken
    pub jailbreak_flagged: usize,
}

impl RegroupSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} examined, {} moved, {} unchanged, {} ungrouped, {} skipped, {} new groups",
            self.examined, self.moved, self.unchanged, self.ungrouped, self.skipped, self.created_groups
        )
    }
}
