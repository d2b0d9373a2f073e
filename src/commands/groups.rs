//! Group inspection and maintenance commands.

use crate::aggregator::{build_group_report, GroupReport};
use crate::output::write_group_report;
use crate::parser::schema::{Group, GroupId};
use crate::parser::signature::{extract_signature, SignatureOutcome};
use crate::store::{crashes, groups, versions, CrashStore, VersionStatus};
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Build the group report for one application version
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `store` - Open crash store
/// * `bundle_identifier` - Application
/// * `affected_version` - Version to report on
/// * `output` - Optional JSON file to write the report to
pub fn execute_groups(
    store: &CrashStore,
    bundle_identifier: &str,
    affected_version: &str,
    output: Option<&Path>,
) -> Result<GroupReport> {
    let conn = store.connection();

    let groups = groups::list_groups(conn, bundle_identifier, affected_version)
        .context("Failed to list groups")?;
    let ungrouped = crashes::count_ungrouped(conn, bundle_identifier, affected_version)
        .context("Failed to count ungrouped crashes")?;

    let report = build_group_report(bundle_identifier, affected_version, &groups, ungrouped);

    if let Some(path) = output {
        write_group_report(&report, path).context("Failed to write group report")?;
        info!("✓ Report written to: {}", path.display());
    }

    Ok(report)
}

/// Set the fix version and/or description of a group
///
/// **Public** - main entry point called from main.rs
///
/// A fix version that is not yet known is registered with status
/// `Assigned`.
///
/// # Returns
/// The updated group
pub fn execute_annotate(
    store: &mut CrashStore,
    group_id: GroupId,
    fix_version: Option<&str>,
    description: Option<&str>,
) -> Result<Group> {
    let tx = store.transaction().context("Failed to start transaction")?;
    let group = groups::load_group(&tx, group_id)
        .with_context(|| format!("Failed to load group {}", group_id))?;

    if let Some(fix_version) = fix_version {
        let fix_version = fix_version.trim();
        groups::set_fix_version(&tx, group_id, fix_version).context("Failed to set fix version")?;

        if !fix_version.is_empty()
            && versions::version_status(&tx, &group.bundle_identifier, fix_version)?.is_none()
        {
            versions::set_version_status(
                &tx,
                &group.bundle_identifier,
                fix_version,
                VersionStatus::Assigned,
            )
            .context("Failed to register fix version")?;
        }
    }

    if let Some(description) = description {
        groups::set_description(&tx, group_id, description.trim())
            .context("Failed to set description")?;
    }

    let updated = groups::load_group(&tx, group_id)?;
    tx.commit().context("Failed to commit transaction")?;

    info!("✓ Group {} updated", group_id);
    Ok(updated)
}

/// Set the lifecycle status of an application version
///
/// **Public** - main entry point called from main.rs
pub fn execute_version_status(
    store: &mut CrashStore,
    bundle_identifier: &str,
    version: &str,
    status: VersionStatus,
) -> Result<()> {
    let tx = store.transaction().context("Failed to start transaction")?;
    versions::set_version_status(&tx, bundle_identifier, version, status)
        .context("Failed to set version status")?;
    tx.commit().context("Failed to commit transaction")?;

    info!("✓ {} {} is now {}", bundle_identifier, version, status);
    Ok(())
}

/// Run the signature pipeline on a log without touching the store
///
/// **Public** - dry run for checking how a log would be grouped
pub fn execute_signature(
    log_text: &str,
    application_name: &str,
    bundle_identifier: Option<&str>,
) -> SignatureOutcome {
    let mut identities = vec![application_name];
    identities.extend(bundle_identifier);
    extract_signature(log_text, &identities)
}
