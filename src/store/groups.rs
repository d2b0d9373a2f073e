//! Group rows.
//!
//! These are the raw reads and writes the group resolver is built from.
//! They do not take locks themselves; callers run them inside a
//! `CrashStore::transaction`.

use super::{optional_timestamp_column, to_unix};
use crate::parser::schema::{Group, GroupId, GroupKey};
use crate::utils::error::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const GROUP_COLUMNS: &str = "id, bundle_identifier, affected_version, pattern, amount, \
                             latest_timestamp, fix_version, description";

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        bundle_identifier: row.get(1)?,
        affected_version: row.get(2)?,
        pattern: row.get(3)?,
        amount: row.get(4)?,
        latest_timestamp: optional_timestamp_column(row, 5)?,
        fix_version: row.get(6)?,
        description: row.get(7)?,
    })
}

/// All groups stored under `key`
///
/// More than one row means the uniqueness invariant is broken; the caller
/// decides how to report that.
pub fn find_groups(conn: &Connection, key: &GroupKey) -> Result<Vec<Group>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GROUP_COLUMNS} FROM crash_groups
         WHERE bundle_identifier = ?1 AND affected_version = ?2 AND pattern = ?3
         ORDER BY id ASC"
    ))?;

    let groups = stmt
        .query_map(
            params![key.bundle_identifier, key.affected_version, key.pattern],
            group_from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

/// Load a group by id
///
/// # Errors
/// * `StoreError::GroupNotFound` - no group with that id
pub fn load_group(conn: &Connection, group_id: GroupId) -> Result<Group, StoreError> {
    conn.query_row(
        &format!("SELECT {GROUP_COLUMNS} FROM crash_groups WHERE id = ?1"),
        params![group_id],
        group_from_row,
    )
    .optional()?
    .ok_or(StoreError::GroupNotFound(group_id))
}

/// Create a group with a single member
pub fn insert_group(
    conn: &Connection,
    key: &GroupKey,
    timestamp: DateTime<Utc>,
    description: &str,
) -> Result<GroupId, StoreError> {
    conn.execute(
        "INSERT INTO crash_groups (
            bundle_identifier, affected_version, pattern, amount, latest_timestamp,
            fix_version, description
         ) VALUES (?1, ?2, ?3, 1, ?4, '', ?5)",
        params![
            key.bundle_identifier,
            key.affected_version,
            key.pattern,
            to_unix(timestamp),
            description
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Count one more member and move the latest timestamp forward if needed
pub fn record_occurrence(
    conn: &Connection,
    group_id: GroupId,
    timestamp: DateTime<Utc>,
) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE crash_groups
         SET amount = amount + 1,
             latest_timestamp = MAX(COALESCE(latest_timestamp, ?2), ?2)
         WHERE id = ?1",
        params![group_id, to_unix(timestamp)],
    )?;
    if updated == 0 {
        return Err(StoreError::GroupNotFound(group_id));
    }
    Ok(())
}

/// Count one member less (never below zero) and recompute the latest
/// timestamp from the crashes still pointing at the group
///
/// The departing crash must already have been reassigned.
pub fn release_member(conn: &Connection, group_id: GroupId) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE crash_groups
         SET amount = MAX(amount - 1, 0),
             latest_timestamp = (SELECT MAX(timestamp) FROM crashes WHERE group_id = ?1)
         WHERE id = ?1",
        params![group_id],
    )?;
    if updated == 0 {
        return Err(StoreError::GroupNotFound(group_id));
    }
    Ok(())
}

/// Overwrite a group's description
pub fn set_description(
    conn: &Connection,
    group_id: GroupId,
    description: &str,
) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE crash_groups SET description = ?2 WHERE id = ?1",
        params![group_id, description],
    )?;
    if updated == 0 {
        return Err(StoreError::GroupNotFound(group_id));
    }
    Ok(())
}

/// Overwrite a group's fix version
pub fn set_fix_version(
    conn: &Connection,
    group_id: GroupId,
    fix_version: &str,
) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE crash_groups SET fix_version = ?2 WHERE id = ?1",
        params![group_id, fix_version],
    )?;
    if updated == 0 {
        return Err(StoreError::GroupNotFound(group_id));
    }
    Ok(())
}

/// Groups of one app version ordered by pattern
pub fn list_groups(
    conn: &Connection,
    bundle_identifier: &str,
    affected_version: &str,
) -> Result<Vec<Group>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {GROUP_COLUMNS} FROM crash_groups
         WHERE bundle_identifier = ?1 AND affected_version = ?2
         ORDER BY pattern ASC"
    ))?;

    let groups = stmt
        .query_map(params![bundle_identifier, affected_version], group_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CrashStore;
    use chrono::TimeZone;

    fn key(pattern: &str) -> GroupKey {
        GroupKey {
            bundle_identifier: "com.foo.App".to_string(),
            affected_version: "1.0".to_string(),
            pattern: pattern.to_string(),
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let id = insert_group(conn, &key("[Foo bar:] (Foo.m:10)"), at(8), "seed").unwrap();
        let found = find_groups(conn, &key("[Foo bar:] (Foo.m:10)")).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
        assert_eq!(found[0].amount, 1);
        assert_eq!(found[0].latest_timestamp, Some(at(8)));
        assert_eq!(found[0].description, "seed");
        assert!(found[0].fix_version.is_empty());

        assert!(find_groups(conn, &key("other (a.c:1)")).unwrap().is_empty());
    }

    #[test]
    fn test_unique_key_enforced() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        insert_group(conn, &key("p (a.c:1)"), at(8), "").unwrap();
        assert!(insert_group(conn, &key("p (a.c:1)"), at(9), "").is_err());
    }

    #[test]
    fn test_record_occurrence_keeps_latest() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let id = insert_group(conn, &key("p (a.c:1)"), at(10), "").unwrap();
        record_occurrence(conn, id, at(8)).unwrap();
        record_occurrence(conn, id, at(12)).unwrap();

        let group = load_group(conn, id).unwrap();
        assert_eq!(group.amount, 3);
        assert_eq!(group.latest_timestamp, Some(at(12)));
    }

    #[test]
    fn test_release_member_floors_at_zero() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let id = insert_group(conn, &key("p (a.c:1)"), at(10), "").unwrap();
        release_member(conn, id).unwrap();
        release_member(conn, id).unwrap();

        let group = load_group(conn, id).unwrap();
        assert_eq!(group.amount, 0);
        assert_eq!(group.latest_timestamp, None);
    }

    #[test]
    fn test_list_groups_sorted() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        insert_group(conn, &key("b (b.c:1)"), at(1), "").unwrap();
        insert_group(conn, &key("a (a.c:1)"), at(1), "").unwrap();

        let patterns: Vec<String> = list_groups(conn, "com.foo.App", "1.0")
            .unwrap()
            .into_iter()
            .map(|g| g.pattern)
            .collect();
        assert_eq!(patterns, vec!["a (a.c:1)", "b (b.c:1)"]);
    }

    #[test]
    fn test_missing_group() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        assert!(matches!(load_group(conn, 5), Err(StoreError::GroupNotFound(5))));
        assert!(record_occurrence(conn, 5, at(1)).is_err());
        assert!(set_description(conn, 5, "x").is_err());
    }
}
