//! Regroup and log update commands.
//!
//! Both re-run stored crashes through the signature pipeline and the
//! group resolver. Each crash gets its own transaction, so a long batch
//! never holds the write lock for more than one crash at a time and a
//! failure leaves earlier crashes regrouped.

use super::models::{RegroupScope, RegroupSummary};
use crate::aggregator::{group_crash, Resolution};
use crate::parser::app_info::is_jailbroken;
use crate::parser::schema::UNGROUPED;
use crate::store::{crashes, CrashStore};
use crate::utils::config::Settings;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the regroup command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `store` - Open crash store
/// * `settings` - App policy and limits
/// * `scope` - Which crashes to regroup
///
/// # Returns
/// Counts of moved, unchanged and ungrouped crashes
///
/// # Errors
/// * Unknown crash id for `RegroupScope::Crash`
/// * Storage failures; crashes handled before the failure stay committed
pub fn execute_regroup(
    store: &mut CrashStore,
    settings: &Settings,
    scope: &RegroupScope,
) -> Result<RegroupSummary> {
    let start_time = Instant::now();
    let mut summary = RegroupSummary::default();

    // Step 1: Collect crashes
    let crash_ids = match (scope, scope.filter()) {
        (RegroupScope::Crash(id), _) => vec![*id],
        (_, Some(filter)) => {
            let tx = store.transaction().context("Failed to start transaction")?;
            summary.jailbreak_flagged = crashes::refresh_jailbreak_flags(&tx, &filter)
                .context("Failed to refresh jailbreak flags")?;
            let ids = crashes::crash_ids(&tx, &filter).context("Failed to list crashes")?;
            tx.commit().context("Failed to commit transaction")?;
            ids
        }
        (_, None) => Vec::new(),
    };

    info!("Regrouping {} crashes", crash_ids.len());

    // Step 2: Regroup one crash per transaction
    for crash_id in crash_ids {
        summary.examined += 1;

        let tx = store.transaction().context("Failed to start transaction")?;
        let crash = crashes::load_crash(&tx, crash_id)
            .with_context(|| format!("Failed to load crash {}", crash_id))?;

        if !settings.policy_for(&crash.bundle_identifier).grouping_enabled {
            debug!("Grouping disabled for {}, skipping crash {}", crash.bundle_identifier, crash_id);
            summary.skipped += 1;
            continue;
        }

        let previous = crash.group_id;
        let outcome = group_crash(&tx, &crash, settings.max_description_len)
            .with_context(|| format!("Failed to regroup crash {}", crash_id))?;
        tx.commit().context("Failed to commit transaction")?;

        tally(&mut summary, previous, &outcome.resolution);
    }

    info!("✓ Regroup finished: {}", summary.summary());
    debug!("Regroup took {:.2}s", start_time.elapsed().as_secs_f64());

    Ok(summary)
}

/// Replace a crash's log (e.g. after symbolication) and regroup it
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `store` - Open crash store
/// * `settings` - App policy and limits
/// * `crash_id` - Crash to update
/// * `log_text` - New log text
///
/// # Returns
/// The new group assignment
pub fn execute_update_log(
    store: &mut CrashStore,
    settings: &Settings,
    crash_id: i64,
    log_text: &str,
) -> Result<Resolution> {
    if log_text.trim().is_empty() {
        anyhow::bail!("Replacement log for crash {} is empty", crash_id);
    }

    let tx = store.transaction().context("Failed to start transaction")?;
    let mut crash = crashes::load_crash(&tx, crash_id)
        .with_context(|| format!("Failed to load crash {}", crash_id))?;

    let jailbreak = crash.jailbreak || is_jailbroken(log_text);
    crashes::replace_log(&tx, crash_id, log_text, jailbreak).context("Failed to replace log")?;
    crash.log_text = log_text.to_string();
    crash.jailbreak = jailbreak;

    let resolution = if settings.policy_for(&crash.bundle_identifier).grouping_enabled {
        group_crash(&tx, &crash, settings.max_description_len)
            .with_context(|| format!("Failed to regroup crash {}", crash_id))?
            .resolution
    } else {
        Resolution {
            group_id: crash.group_id,
            created: false,
            regrouped_from: None,
        }
    };

    tx.commit().context("Failed to commit transaction")?;

    info!("✓ Log of crash {} replaced, group {}", crash_id, resolution.group_id);
    Ok(resolution)
}

/// **Private** - internal helper for execute_regroup
fn tally(summary: &mut RegroupSummary, previous: i64, resolution: &Resolution) {
    if resolution.group_id == previous {
        summary.unchanged += 1;
    } else {
        summary.moved += 1;
    }
    if resolution.group_id == UNGROUPED {
        summary.ungrouped += 1;
    }
    if resolution.created {
        summary.created_groups += 1;
    }
}
