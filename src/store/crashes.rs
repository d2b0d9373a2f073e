//! Crash report rows.

use super::{timestamp_column, to_unix};
use crate::parser::schema::{CrashReport, GroupId};
use crate::utils::config::JAILBREAK_MARKER;
use crate::utils::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};

const INSERT_CRASH: &str = "
    INSERT INTO crashes (
        bundle_identifier, application_name, affected_version, system_version,
        platform, log, timestamp, group_id, jailbreak
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
";

const SELECT_CRASH: &str = "
    SELECT id, bundle_identifier, application_name, affected_version, system_version,
           platform, log, timestamp, group_id, jailbreak
    FROM crashes WHERE id = ?1
";

/// Which crashes a batch operation touches
#[derive(Debug, Clone, Default)]
pub struct CrashFilter {
    pub bundle_identifier: Option<String>,
    pub affected_version: Option<String>,
    pub group_id: Option<GroupId>,
}

fn crash_from_row(row: &Row<'_>) -> rusqlite::Result<CrashReport> {
    Ok(CrashReport {
        id: row.get(0)?,
        bundle_identifier: row.get(1)?,
        application_name: row.get(2)?,
        affected_version: row.get(3)?,
        system_version: row.get(4)?,
        platform: row.get(5)?,
        log_text: row.get(6)?,
        timestamp: timestamp_column(row, 7)?,
        group_id: row.get(8)?,
        jailbreak: row.get(9)?,
    })
}

/// Persist a new crash and return its id
pub fn insert_crash(conn: &Connection, crash: &CrashReport) -> Result<i64, StoreError> {
    conn.execute(
        INSERT_CRASH,
        params![
            crash.bundle_identifier,
            crash.application_name,
            crash.affected_version,
            crash.system_version,
            crash.platform,
            crash.log_text,
            to_unix(crash.timestamp),
            crash.group_id,
            crash.jailbreak,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Load a crash by id
///
/// # Errors
/// * `StoreError::CrashNotFound` - no crash with that id
pub fn load_crash(conn: &Connection, crash_id: i64) -> Result<CrashReport, StoreError> {
    conn.query_row(SELECT_CRASH, params![crash_id], crash_from_row)
        .optional()?
        .ok_or(StoreError::CrashNotFound(crash_id))
}

/// Point a crash at a group
pub fn assign_group(conn: &Connection, crash_id: i64, group_id: GroupId) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE crashes SET group_id = ?2 WHERE id = ?1",
        params![crash_id, group_id],
    )?;
    if updated == 0 {
        return Err(StoreError::CrashNotFound(crash_id));
    }
    Ok(())
}

/// Replace the log text of a crash, e.g. with a symbolicated version
pub fn replace_log(
    conn: &Connection,
    crash_id: i64,
    log_text: &str,
    jailbreak: bool,
) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE crashes SET log = ?2, jailbreak = ?3 WHERE id = ?1",
        params![crash_id, log_text, jailbreak],
    )?;
    if updated == 0 {
        return Err(StoreError::CrashNotFound(crash_id));
    }
    Ok(())
}

/// Ids of all crashes matching `filter`, oldest first
pub fn crash_ids(conn: &Connection, filter: &CrashFilter) -> Result<Vec<i64>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id FROM crashes
         WHERE (?1 IS NULL OR bundle_identifier = ?1)
           AND (?2 IS NULL OR affected_version = ?2)
           AND (?3 IS NULL OR group_id = ?3)
         ORDER BY id ASC",
    )?;

    let ids = stmt
        .query_map(
            params![
                filter.bundle_identifier,
                filter.affected_version,
                filter.group_id
            ],
            |row| row.get(0),
        )?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

/// Mark every matching crash whose log shows a jailbreak
///
/// # Returns
/// Number of crashes flagged
pub fn refresh_jailbreak_flags(conn: &Connection, filter: &CrashFilter) -> Result<usize, StoreError> {
    let flagged = conn.execute(
        "UPDATE crashes SET jailbreak = 1
         WHERE jailbreak = 0
           AND instr(log, ?4) > 0
           AND (?1 IS NULL OR bundle_identifier = ?1)
           AND (?2 IS NULL OR affected_version = ?2)
           AND (?3 IS NULL OR group_id = ?3)",
        params![
            filter.bundle_identifier,
            filter.affected_version,
            filter.group_id,
            JAILBREAK_MARKER
        ],
    )?;
    Ok(flagged)
}

/// Number of crashes of a version that carry no group
pub fn count_ungrouped(
    conn: &Connection,
    bundle_identifier: &str,
    affected_version: &str,
) -> Result<u32, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM crashes
         WHERE bundle_identifier = ?1 AND affected_version = ?2 AND group_id = 0",
        params![bundle_identifier, affected_version],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Number of crashes pointing at a group
pub fn count_members(conn: &Connection, group_id: GroupId) -> Result<u32, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM crashes WHERE group_id = ?1",
        params![group_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::schema::UNGROUPED;
    use crate::store::CrashStore;
    use chrono::{TimeZone, Utc};

    fn crash(version: &str, log: &str) -> CrashReport {
        CrashReport {
            id: 0,
            bundle_identifier: "com.foo.App".to_string(),
            application_name: "Foo".to_string(),
            affected_version: version.to_string(),
            system_version: "17.2".to_string(),
            platform: "iPhone".to_string(),
            log_text: log.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            group_id: UNGROUPED,
            jailbreak: false,
        }
    }

    #[test]
    fn test_insert_and_load() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let id = insert_crash(conn, &crash("1.0", "log")).unwrap();
        let loaded = load_crash(conn, id).unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.affected_version, "1.0");
        assert_eq!(loaded.timestamp, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(loaded.group_id, UNGROUPED);
    }

    #[test]
    fn test_missing_crash() {
        let store = CrashStore::open_in_memory().unwrap();
        assert!(matches!(
            load_crash(store.connection(), 42),
            Err(StoreError::CrashNotFound(42))
        ));
        assert!(assign_group(store.connection(), 42, 1).is_err());
    }

    #[test]
    fn test_filter_and_counts() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let a = insert_crash(conn, &crash("1.0", "a")).unwrap();
        let b = insert_crash(conn, &crash("1.0", "b")).unwrap();
        let c = insert_crash(conn, &crash("2.0", "c")).unwrap();
        assign_group(conn, b, 7).unwrap();

        let all = crash_ids(conn, &CrashFilter::default()).unwrap();
        assert_eq!(all, vec![a, b, c]);

        let v1 = crash_ids(
            conn,
            &CrashFilter {
                affected_version: Some("1.0".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(v1, vec![a, b]);

        let grouped = crash_ids(
            conn,
            &CrashFilter {
                group_id: Some(7),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(grouped, vec![b]);

        assert_eq!(count_ungrouped(conn, "com.foo.App", "1.0").unwrap(), 1);
        assert_eq!(count_members(conn, 7).unwrap(), 1);
    }

    #[test]
    fn test_jailbreak_refresh() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let jailbroken = insert_crash(conn, &crash("1.0", "9 MobileSubstrate.dylib 0x1")).unwrap();
        let clean = insert_crash(conn, &crash("1.0", "9 UIKit 0x1")).unwrap();

        let flagged = refresh_jailbreak_flags(conn, &CrashFilter::default()).unwrap();
        assert_eq!(flagged, 1);
        assert!(load_crash(conn, jailbroken).unwrap().jailbreak);
        assert!(!load_crash(conn, clean).unwrap().jailbreak);
    }

    #[test]
    fn test_replace_log() {
        let store = CrashStore::open_in_memory().unwrap();
        let conn = store.connection();

        let id = insert_crash(conn, &crash("1.0", "raw")).unwrap();
        replace_log(conn, id, "symbolicated", false).unwrap();
        assert_eq!(load_crash(conn, id).unwrap().log_text, "symbolicated");
    }
}
