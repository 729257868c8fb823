use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use smarthome_common::{Error, Result};

use crate::database::{format_datetime, is_unique_violation, try_parse_datetime};

pub const TRACKING_TABLE: &str = "migrations";

/// A row of the tracking table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigrationRecord {
    pub version: String,
    pub name: String,
    pub applied_at: DateTime<Utc>,
    pub checksum: String,
}

/// Reads and appends rows of the `migrations` tracking table. Every function
/// takes the connection (or open transaction) it should run on.
pub struct AppliedSetStore;

impl AppliedSetStore {
    pub fn ensure_table(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS migrations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                version TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                checksum TEXT CHECK (checksum IS NULL OR length(checksum) = 64)
            );",
        )
        .map_err(|e| Error::Query(format!("failed to create migrations table: {e}")))?;
        Ok(())
    }

    /// Whether the tracking table has been created yet. Read-only.
    pub fn exists(conn: &Connection) -> Result<bool> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![TRACKING_TABLE],
                |row| row.get(0),
            )
            .map_err(|e| Error::Query(format!("failed to inspect schema: {e}")))?;
        Ok(count > 0)
    }

    pub fn applied_versions(conn: &Connection) -> Result<BTreeSet<String>> {
        let mut stmt = conn
            .prepare("SELECT version FROM migrations ORDER BY version")
            .map_err(|e| Error::Query(format!("failed to get applied migrations: {e}")))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| Error::Query(format!("failed to get applied migrations: {e}")))?;

        let mut applied = BTreeSet::new();
        for row in rows {
            applied.insert(
                row.map_err(|e| Error::Query(format!("failed to read migration row: {e}")))?,
            );
        }
        Ok(applied)
    }

    /// Insert the tracking row for `version`. A version that is already
    /// recorded surfaces as `Error::Conflict`.
    pub fn record(
        conn: &Connection,
        version: &str,
        name: &str,
        checksum: &str,
        applied_at: DateTime<Utc>,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO migrations (version, name, applied_at, checksum)
             VALUES (?1, ?2, ?3, ?4)",
            params![version, name, format_datetime(applied_at), checksum],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!("migration version {version} already recorded"))
            } else {
                Error::Record(format!("failed to record migration {version}: {e}"))
            }
        })?;
        Ok(())
    }

    pub fn list(conn: &Connection) -> Result<Vec<AppliedMigrationRecord>> {
        let mut stmt = conn
            .prepare(
                "SELECT version, name, applied_at, COALESCE(checksum, '')
                 FROM migrations
                 ORDER BY version",
            )
            .map_err(|e| Error::Query(format!("failed to get migration status: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(|e| Error::Query(format!("failed to get migration status: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let (version, name, applied_at, checksum) =
                row.map_err(|e| Error::Query(format!("failed to read migration row: {e}")))?;
            let applied_at = try_parse_datetime(&applied_at).ok_or_else(|| {
                Error::Query(format!(
                    "migration {version} has an unreadable applied_at: {applied_at}"
                ))
            })?;
            records.push(AppliedMigrationRecord {
                version,
                name,
                applied_at,
                checksum,
            });
        }
        Ok(records)
    }
}
