//! Application version registry.

use crate::utils::error::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an application version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    /// Seen in a crash, nothing known yet
    Unknown,
    /// Assigned as fix version for a group
    Assigned,
    /// Submitted to the store
    Submitted,
    /// Released to users
    Available,
    /// No longer supported; crashes are rejected
    Discontinued,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Unknown => "unknown",
            VersionStatus::Assigned => "assigned",
            VersionStatus::Submitted => "submitted",
            VersionStatus::Available => "available",
            VersionStatus::Discontinued => "discontinued",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Ok(VersionStatus::Unknown),
            "assigned" => Ok(VersionStatus::Assigned),
            "submitted" => Ok(VersionStatus::Submitted),
            "available" => Ok(VersionStatus::Available),
            "discontinued" => Ok(VersionStatus::Discontinued),
            other => Err(StoreError::InvalidValue(format!("version status '{}'", other))),
        }
    }
}

/// Status of a version, if it is registered
pub fn version_status(
    conn: &Connection,
    bundle_identifier: &str,
    version: &str,
) -> Result<Option<VersionStatus>, StoreError> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM versions WHERE bundle_identifier = ?1 AND version = ?2",
            params![bundle_identifier, version],
            |row| row.get(0),
        )
        .optional()?;

    status.map(|s| s.parse()).transpose()
}

/// Register a version if it is new and return its status
pub fn register_version(
    conn: &Connection,
    bundle_identifier: &str,
    version: &str,
) -> Result<VersionStatus, StoreError> {
    conn.execute(
        "INSERT OR IGNORE INTO versions (bundle_identifier, version, status) VALUES (?1, ?2, ?3)",
        params![bundle_identifier, version, VersionStatus::Unknown.as_str()],
    )?;

    Ok(version_status(conn, bundle_identifier, version)?.unwrap_or(VersionStatus::Unknown))
}

/// Set the status of a version, registering it if needed
pub fn set_version_status(
    conn: &Connection,
    bundle_identifier: &str,
    version: &str,
    status: VersionStatus,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO versions (bundle_identifier, version, status) VALUES (?1, ?2, ?3)
         ON CONFLICT(bundle_identifier, version) DO UPDATE SET status = excluded.status",
        params![bundle_identifier, version, status.as_str()],
    )?;
    Ok(())
}
