//! Group resolution: map a crash and its signature onto a persisted group.
//!
//! All functions here expect to run inside a `CrashStore::transaction`.
//! The transaction holds the write lock from the start, so looking up the
//! group key and then inserting or incrementing cannot race with another
//! process doing the same for an identical signature.

use super::description::{merge_description, seed_description, MergeOutcome};
use crate::parser::app_info::extract_app_info;
use crate::parser::schema::{CrashReport, GroupId, UNGROUPED};
use crate::parser::signature::{extract_signature, SignatureOutcome};
use crate::store::{crashes, groups};
use crate::utils::error::StoreError;
use log::{debug, info, warn};
use rusqlite::Connection;

/// What the resolver did with one crash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Group the crash now belongs to (`UNGROUPED` for an empty pattern)
    pub group_id: GroupId,

    /// A new group was created for this crash
    pub created: bool,

    /// Group the crash was moved out of, if it changed groups
    pub regrouped_from: Option<GroupId>,
}

impl Resolution {
    /// The crash ended up in a different group than before
    pub fn moved(&self) -> bool {
        self.regrouped_from.is_some()
    }
}

/// Signature extraction plus group resolution for one crash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingOutcome {
    pub signature: SignatureOutcome,
    pub resolution: Resolution,
}

/// Resolve the group for a persisted crash
///
/// **Public** - core of ingest, regroup and log updates
///
/// # Arguments
/// * `conn` - Open write transaction
/// * `crash` - The crash, with `id` set and `group_id` holding its current group
/// * `pattern` - Signature pattern; empty means ungrouped
/// * `app_info` - Supplementary text merged into the group description
/// * `max_description_len` - Description length limit in characters
///
/// # Returns
/// The resulting group assignment
///
/// # Errors
/// * `StoreError::DuplicateGroup` - more than one group shares the key
/// * `StoreError::Sqlite` - any storage failure; the caller's transaction
///   must then be dropped so nothing is committed
pub fn resolve_group(
    conn: &Connection,
    crash: &CrashReport,
    pattern: &str,
    app_info: Option<&str>,
    max_description_len: usize,
) -> Result<Resolution, StoreError> {
    let previous = crash.group_id;
    let mut created = false;

    let group_id = if pattern.is_empty() {
        UNGROUPED
    } else {
        let key = crash.group_key(pattern);
        let mut found = groups::find_groups(conn, &key)?;

        match found.len() {
            0 => {
                let description = seed_description(app_info, max_description_len);
                let id = groups::insert_group(conn, &key, crash.timestamp, &description)?;
                info!("Created group {} for pattern: {}", id, pattern);
                created = true;
                id
            }
            1 => {
                let group = found.remove(0);
                if group.id != previous {
                    groups::record_occurrence(conn, group.id, crash.timestamp)?;
                }
                if let Some(addition) = app_info {
                    match merge_description(&group.description, addition, max_description_len) {
                        MergeOutcome::Appended(text) => {
                            groups::set_description(conn, group.id, &text)?;
                        }
                        MergeOutcome::Unchanged => {}
                        MergeOutcome::TooLong => warn!(
                            "Description of group {} would exceed {} characters, not extended",
                            group.id, max_description_len
                        ),
                    }
                }
                group.id
            }
            count => {
                return Err(StoreError::DuplicateGroup {
                    bundle_identifier: key.bundle_identifier,
                    affected_version: key.affected_version,
                    pattern: key.pattern,
                    count,
                });
            }
        }
    };

    crashes::assign_group(conn, crash.id, group_id)?;

    let regrouped_from = if previous != UNGROUPED && previous != group_id {
        match groups::release_member(conn, previous) {
            Ok(()) => {}
            Err(StoreError::GroupNotFound(id)) => {
                warn!("Crash {} referenced missing group {}", crash.id, id)
            }
            Err(e) => return Err(e),
        }
        debug!("Crash {} moved from group {} to {}", crash.id, previous, group_id);
        Some(previous)
    } else {
        None
    };

    Ok(Resolution {
        group_id,
        created,
        regrouped_from,
    })
}

/// Run the signature pipeline on a crash's log and resolve its group
///
/// **Public** - shared by every command that (re)groups a crash
///
/// The application name is the primary frame matcher and the bundle
/// identifier the fallback.
pub fn group_crash(
    conn: &Connection,
    crash: &CrashReport,
    max_description_len: usize,
) -> Result<GroupingOutcome, StoreError> {
    let identities = [crash.application_name.as_str(), crash.bundle_identifier.as_str()];
    let signature = extract_signature(&crash.log_text, &identities);

    if let Some(reason) = signature.miss_reason() {
        warn!("Crash {} has no signature: {}", crash.id, reason);
    }

    let app_info = extract_app_info(&crash.log_text);
    let resolution = resolve_group(
        conn,
        crash,
        signature.pattern(),
        app_info.as_deref(),
        max_description_len,
    )?;

    Ok(GroupingOutcome {
        signature,
        resolution,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CrashStore;
    use chrono::{TimeZone, Utc};

    fn stored_crash(conn: &Connection, log: &str) -> CrashReport {
        let mut crash = CrashReport {
            id: 0,
            bundle_identifier: "com.foo.App".to_string(),
            application_name: "Foo".to_string(),
            affected_version: "1.0".to_string(),
            system_version: "17.2".to_string(),
            platform: "iPhone".to_string(),
            log_text: log.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            group_id: UNGROUPED,
            jailbreak: false,
        };
        crash.id = crashes::insert_crash(conn, &crash).unwrap();
        crash
    }

    #[test]
    fn test_empty_pattern_is_ungrouped() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();
        let crash = stored_crash(conn, "");

        let resolution = resolve_group(conn, &crash, "", Some("info"), 100).unwrap();
        assert_eq!(resolution.group_id, UNGROUPED);
        assert!(!resolution.created);

        let groups: i64 = conn
            .query_row("SELECT COUNT(*) FROM crash_groups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(groups, 0);
    }

    #[test]
    fn test_create_then_join() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let first = stored_crash(conn, "");
        let second = stored_crash(conn, "");

        let a = resolve_group(conn, &first, "p (a.m:1)", None, 100).unwrap();
        let b = resolve_group(conn, &second, "p (a.m:1)", None, 100).unwrap();

        assert!(a.created);
        assert!(!b.created);
        assert_eq!(a.group_id, b.group_id);
        assert_eq!(groups::load_group(conn, a.group_id).unwrap().amount, 2);
        assert_eq!(crashes::load_crash(conn, second.id).unwrap().group_id, a.group_id);
    }

    #[test]
    fn test_same_group_is_not_counted_twice() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let mut crash = stored_crash(conn, "");
        let first = resolve_group(conn, &crash, "p (a.m:1)", None, 100).unwrap();
        crash.group_id = first.group_id;

        let again = resolve_group(conn, &crash, "p (a.m:1)", None, 100).unwrap();
        assert_eq!(again.group_id, first.group_id);
        assert!(!again.moved());
        assert_eq!(groups::load_group(conn, first.group_id).unwrap().amount, 1);
    }

    #[test]
    fn test_description_seeded_and_merged() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let first = stored_crash(conn, "");
        let second = stored_crash(conn, "");
        let third = stored_crash(conn, "");

        let id = resolve_group(conn, &first, "p (a.m:1)", Some("reason A"), 100)
            .unwrap()
            .group_id;
        resolve_group(conn, &second, "p (a.m:1)", Some("reason A"), 100).unwrap();
        resolve_group(conn, &third, "p (a.m:1)", Some("reason B"), 100).unwrap();

        assert_eq!(
            groups::load_group(conn, id).unwrap().description,
            "reason A\n\nreason B"
        );
    }

    #[test]
    fn test_duplicate_groups_are_reported() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();
        conn.execute_batch("DROP INDEX idx_groups_key").unwrap();

        let crash = stored_crash(conn, "");
        let key = crash.group_key("p (a.m:1)");
        groups::insert_group(conn, &key, crash.timestamp, "").unwrap();
        groups::insert_group(conn, &key, crash.timestamp, "").unwrap();

        let err = resolve_group(conn, &crash, "p (a.m:1)", None, 100).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateGroup { count: 2, .. }));
    }
}
