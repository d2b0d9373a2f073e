//! SQLite persistence for crashes, groups and versions.
//!
//! Every pipeline invocation opens its own `CrashStore`. Writes go through
//! `CrashStore::transaction`, which takes the database write lock up front
//! (`BEGIN IMMEDIATE`) so the group lookup and the following insert or
//! increment cannot interleave with another writer.

pub mod crashes;
pub mod groups;
pub mod versions;

mod schema;

use crate::utils::config::BUSY_TIMEOUT;
use crate::utils::error::StoreError;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use std::path::Path;

pub use crashes::CrashFilter;
pub use versions::VersionStatus;

/// Handle to the crash database
pub struct CrashStore {
    conn: Connection,
}

impl CrashStore {
    /// Open (and create if needed) the database at `db_path`
    ///
    /// **Public** - one call per pipeline invocation
    ///
    /// # Errors
    /// * `StoreError::Io` - parent directory cannot be created
    /// * `StoreError::Sqlite` - database cannot be opened or migrated
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating database directory: {}", parent.display());
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::configure(conn, false)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, true)
    }

    fn configure(conn: Connection, in_memory: bool) -> Result<Self, StoreError> {
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        if !in_memory && !journal_mode.eq_ignore_ascii_case("wal") {
            warn!("WAL journaling unavailable, running in '{}' mode", journal_mode);
        }

        let store = Self { conn };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    /// Start a write transaction holding the database write lock
    ///
    /// Dropping the transaction without calling `commit` rolls it back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(tx)
    }

    /// Read-only access for queries outside a transaction
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Seconds since the epoch, as stored in the database
pub(crate) fn to_unix(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp()
}

/// Read a unix timestamp column
pub(crate) fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let secs: i64 = row.get(idx)?;
    DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

/// Read a nullable unix timestamp column
pub(crate) fn optional_timestamp_column(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let secs: Option<i64> = row.get(idx)?;
    secs.map(|secs| {
        DateTime::from_timestamp(secs, 0).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
    })
    .transpose()
}
