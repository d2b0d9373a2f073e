//! Ingest command implementation.
//!
//! The ingest command:
//! 1. Validates the submission
//! 2. Checks the app policy and the version registry
//! 3. Stores the crash
//! 4. Extracts its signature and resolves its group
//! 5. Derives the status returned to the client
//!
//! Steps 3 and 4 share one write transaction: either the crash and its
//! group update are both committed, or neither is.

use super::models::{IngestOutcome, RejectReason, SubmissionStatus};
use crate::aggregator::group_crash;
use crate::parser::schema::{CrashReport, CrashSubmission, GroupId, UNGROUPED};
use crate::store::{crashes, groups, versions, CrashStore, VersionStatus};
use crate::utils::config::Settings;
use crate::utils::error::StoreError;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use rusqlite::Connection;

/// Execute the ingest command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `store` - Open crash store
/// * `settings` - App policy and limits
/// * `submission` - Parsed crash submission
///
/// # Returns
/// The outcome, including the status for the client
///
/// # Errors
/// * Submission validation failures
/// * Storage failures (nothing is committed in that case)
pub fn execute_ingest(
    store: &mut CrashStore,
    settings: &Settings,
    submission: &CrashSubmission,
) -> Result<IngestOutcome> {
    info!(
        "Ingesting crash for {} {}",
        submission.bundle_identifier, submission.affected_version
    );

    // Step 1: Validate
    submission.validate().context("Invalid crash submission")?;

    // Step 2: Policy
    let policy = settings.policy_for(&submission.bundle_identifier);
    if !policy.accepted {
        warn!("Rejected crash for unknown app: {}", submission.bundle_identifier);
        return Ok(IngestOutcome::rejected(RejectReason::AppNotAccepted));
    }

    let tx = store.transaction().context("Failed to start transaction")?;

    let version_status = versions::register_version(
        &tx,
        &submission.bundle_identifier,
        &submission.affected_version,
    )
    .context("Failed to register version")?;

    if version_status == VersionStatus::Discontinued {
        tx.commit().context("Failed to commit transaction")?;
        info!(
            "Rejected crash for discontinued version {} {}",
            submission.bundle_identifier, submission.affected_version
        );
        return Ok(IngestOutcome::rejected(RejectReason::VersionDiscontinued));
    }

    // Step 3: Store
    let mut crash = CrashReport::from_submission(submission);
    crash.id = crashes::insert_crash(&tx, &crash).context("Failed to store crash")?;
    debug!("Stored crash {} (jailbreak: {})", crash.id, crash.jailbreak);

    // Step 4: Group
    let (group_id, created_group, miss) = if policy.grouping_enabled {
        let outcome = group_crash(&tx, &crash, settings.max_description_len)
            .with_context(|| format!("Failed to group crash {}", crash.id))?;
        (
            outcome.resolution.group_id,
            outcome.resolution.created,
            outcome.signature.miss_reason(),
        )
    } else {
        debug!("Grouping disabled for {}", submission.bundle_identifier);
        (UNGROUPED, false, None)
    };

    // Step 5: Status
    let status = submission_status(&tx, &crash.bundle_identifier, group_id)
        .context("Failed to determine submission status")?;

    tx.commit().context("Failed to commit transaction")?;

    info!("✓ Crash {} stored in group {} ({})", crash.id, group_id, status);

    Ok(IngestOutcome {
        status,
        crash_id: Some(crash.id),
        group_id,
        created_group,
        reject_reason: None,
        miss: IngestOutcome::miss_reason(miss),
    })
}

/// Status of an accepted crash, judged by its group's fix version
///
/// **Private** - internal helper for execute_ingest
fn submission_status(
    conn: &Connection,
    bundle_identifier: &str,
    group_id: GroupId,
) -> Result<SubmissionStatus, StoreError> {
    if group_id == UNGROUPED {
        return Ok(SubmissionStatus::AcceptedUnknown);
    }

    let group = groups::load_group(conn, group_id)?;
    if group.fix_version.is_empty() {
        return Ok(SubmissionStatus::AcceptedUnknown);
    }

    let status = match versions::version_status(conn, bundle_identifier, &group.fix_version)? {
        Some(VersionStatus::Available) => SubmissionStatus::AcceptedKnownGood,
        _ => SubmissionStatus::AcceptedKnownBad,
    };
    Ok(status)
}
