//! Versioned schema migrations.
//!
//! Scripts named `<version>_<name>.sql` are loaded from a [`MigrationSource`],
//! diffed against the `migrations` tracking table, and the pending ones are
//! applied in version order. Each script and its tracking row commit in one
//! transaction; the first failure aborts the run.

mod source;
mod tracking;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use smarthome_common::{Error, Result};
use tracing::info;

use crate::database::Database;

pub use source::{MigrationScript, MigrationSource, SCRIPT_EXTENSION, checksum, parse_filename};
pub use tracking::{AppliedMigrationRecord, AppliedSetStore, TRACKING_TABLE};

/// Outcome of a `run`.
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    pub applied: Vec<MigrationScript>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }

    pub fn versions(&self) -> Vec<&str> {
        self.applied.iter().map(|s| s.version.as_str()).collect()
    }
}

/// Applies pending migrations from a source against one database.
pub struct Migrator {
    db: Arc<Database>,
    source: MigrationSource,
}

impl Migrator {
    /// Migrator over the scripts bundled into this crate.
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_source(db, MigrationSource::bundled())
    }

    pub fn with_source(db: Arc<Database>, source: MigrationSource) -> Self {
        Self { db, source }
    }

    /// Bring the schema up to the latest script.
    pub fn run(&self) -> Result<MigrationReport> {
        {
            let conn = self.db.connection()?;
            AppliedSetStore::ensure_table(&conn)?;
        }

        let scripts = self.source.load()?;
        let applied = {
            let conn = self.db.connection()?;
            AppliedSetStore::applied_versions(&conn)?
        };

        let pending = find_pending(scripts, &applied);
        if pending.is_empty() {
            info!("no pending migrations found");
            return Ok(MigrationReport::default());
        }

        for script in &pending {
            info!("running migration: {} ({})", script.version, script.name);
            self.execute(script)?;
            info!("migration {} completed successfully", script.version);
        }

        info!("applied {} migration(s)", pending.len());
        Ok(MigrationReport { applied: pending })
    }

    /// Applied records ordered by version. Read-only; an uninitialised
    /// database has no records.
    pub fn status(&self) -> Result<Vec<AppliedMigrationRecord>> {
        let conn = self.db.connection()?;
        if !AppliedSetStore::exists(&conn)? {
            return Ok(Vec::new());
        }
        AppliedSetStore::list(&conn)
    }

    /// Scripts that `run` would apply, without applying them.
    pub fn pending(&self) -> Result<Vec<MigrationScript>> {
        let scripts = self.source.load()?;
        let applied = {
            let conn = self.db.connection()?;
            if AppliedSetStore::exists(&conn)? {
                AppliedSetStore::applied_versions(&conn)?
            } else {
                BTreeSet::new()
            }
        };
        Ok(find_pending(scripts, &applied))
    }

    fn execute(&self, script: &MigrationScript) -> Result<()> {
        let mut conn = self.db.connection()?;
        let tx = conn.transaction().map_err(|e| {
            Error::Execution(format!(
                "failed to begin transaction for migration {}: {e}",
                script.version
            ))
        })?;

        tx.execute_batch(&script.content).map_err(|e| {
            Error::Execution(format!(
                "migration {} ({}) failed: {e}",
                script.version, script.filename
            ))
        })?;

        AppliedSetStore::record(
            &tx,
            &script.version,
            &script.name,
            &script.checksum,
            Utc::now(),
        )?;

        tx.commit().map_err(|e| {
            Error::Execution(format!(
                "failed to commit migration {}: {e}",
                script.version
            ))
        })
    }
}

/// Scripts whose version is not in `applied`, in their original order.
/// Checksums of already-applied versions are not compared.
fn find_pending(scripts: Vec<MigrationScript>, applied: &BTreeSet<String>) -> Vec<MigrationScript> {
    scripts
        .into_iter()
        .filter(|s| !applied.contains(&s.version))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Arc<Database> {
        Arc::new(Database::in_memory().unwrap())
    }

    fn migrator(db: &Arc<Database>, files: &[(&str, &str)]) -> Migrator {
        Migrator::with_source(db.clone(), MigrationSource::from_files(files.iter().copied()))
    }

    fn table_exists(db: &Database, table: &str) -> bool {
        let conn = db.connection().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .unwrap()
            > 0
    }

    fn status_versions(migrator: &Migrator) -> Vec<String> {
        migrator
            .status()
            .unwrap()
            .into_iter()
            .map(|r| r.version)
            .collect()
    }

    #[test]
    fn applies_init_and_seed_scripts() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("001_init.sql", "CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT);"),
                ("002_seed.sql", "INSERT INTO t (label) VALUES ('first');"),
            ],
        );

        let report = migrator.run().unwrap();
        assert_eq!(report.versions(), ["001", "002"]);
        assert_eq!(status_versions(&migrator), ["001", "002"]);

        let conn = db.connection().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn second_run_is_a_noop() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("001_init.sql", "CREATE TABLE t (id INTEGER PRIMARY KEY);"),
                ("002_seed.sql", "INSERT INTO t DEFAULT VALUES;"),
            ],
        );

        assert_eq!(migrator.run().unwrap().applied.len(), 2);
        let second = migrator.run().unwrap();
        assert!(second.is_noop());

        let conn = db.connection().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn failing_script_aborts_run_and_rolls_back() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("001_init.sql", "CREATE TABLE t (id INTEGER PRIMARY KEY);"),
                (
                    "002_broken.sql",
                    "CREATE TABLE half_done (id INTEGER); INSERT INTO nowhere VALUES (1);",
                ),
                ("003_later.sql", "CREATE TABLE later (id INTEGER);"),
            ],
        );

        let err = migrator.run().unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
        assert!(err.to_string().contains("002"));

        assert_eq!(status_versions(&migrator), ["001"]);
        assert!(table_exists(&db, "t"));
        assert!(!table_exists(&db, "half_done"));
        assert!(!table_exists(&db, "later"));
    }

    #[test]
    fn failed_tracking_insert_rolls_back_script() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("001_a.sql", "CREATE TABLE a (id INTEGER);"),
                (
                    "002_b.sql",
                    "CREATE TABLE b (id INTEGER);
                     INSERT INTO migrations (version, name) VALUES ('002', 'claimed');",
                ),
                ("003_c.sql", "CREATE TABLE c (id INTEGER);"),
            ],
        );

        let err = migrator.run().unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(err.to_string().contains("002"));

        assert!(table_exists(&db, "a"));
        assert!(!table_exists(&db, "b"));
        assert!(!table_exists(&db, "c"));
        assert_eq!(status_versions(&migrator), ["001"]);
    }

    #[test]
    fn only_unapplied_versions_run() {
        let db = db();
        {
            let conn = db.connection().unwrap();
            AppliedSetStore::ensure_table(&conn).unwrap();
            AppliedSetStore::record(&conn, "002", "b", &checksum(b"x"), Utc::now()).unwrap();
        }

        let migrator = migrator(
            &db,
            &[
                ("001_a.sql", "CREATE TABLE a (id INTEGER);"),
                ("002_b.sql", "CREATE TABLE b (id INTEGER);"),
                ("003_c.sql", "CREATE TABLE c (id INTEGER);"),
            ],
        );

        let report = migrator.run().unwrap();
        assert_eq!(report.versions(), ["001", "003"]);
        assert!(table_exists(&db, "a"));
        assert!(!table_exists(&db, "b"));
        assert!(table_exists(&db, "c"));
    }

    #[test]
    fn changed_content_of_applied_version_is_skipped() {
        let db = db();
        migrator(&db, &[("001_init.sql", "CREATE TABLE t (id INTEGER);")])
            .run()
            .unwrap();

        let edited = migrator(
            &db,
            &[("001_init.sql", "CREATE TABLE t (id INTEGER, extra TEXT);")],
        );
        assert!(edited.run().unwrap().is_noop());

        let records = edited.status().unwrap();
        assert_eq!(records[0].checksum, checksum(b"CREATE TABLE t (id INTEGER);"));
    }

    #[test]
    fn unpadded_versions_apply_in_string_order() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("1_one.sql", "CREATE TABLE log (step TEXT); INSERT INTO log VALUES ('1');"),
                ("2_two.sql", "INSERT INTO log VALUES ('2');"),
                ("10_ten.sql", "INSERT INTO log VALUES ('10');"),
            ],
        );

        let report = migrator.run().unwrap();
        assert_eq!(report.versions(), ["1", "10", "2"]);

        let conn = db.connection().unwrap();
        let mut stmt = conn.prepare("SELECT step FROM log ORDER BY rowid").unwrap();
        let steps: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(steps, ["1", "10", "2"]);
    }

    #[test]
    fn status_matches_applied_scripts() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("002_b.sql", "CREATE TABLE b (id INTEGER);"),
                ("001_a.sql", "CREATE TABLE a (id INTEGER);"),
            ],
        );
        let report = migrator.run().unwrap();
        let records = migrator.status().unwrap();

        assert_eq!(records.len(), report.applied.len());
        for (record, script) in records.iter().zip(&report.applied) {
            assert_eq!(record.version, script.version);
            assert_eq!(record.name, script.name);
            assert_eq!(record.checksum, script.checksum);
        }
    }

    #[test]
    fn status_on_fresh_database_is_empty_and_read_only() {
        let db = db();
        let migrator = Migrator::new(db.clone());
        assert!(migrator.status().unwrap().is_empty());
        assert!(!table_exists(&db, TRACKING_TABLE));
    }

    #[test]
    fn pending_lists_without_applying() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("001_a.sql", "CREATE TABLE a (id INTEGER);"),
                ("002_b.sql", "CREATE TABLE b (id INTEGER);"),
            ],
        );

        let pending = migrator.pending().unwrap();
        assert_eq!(pending.len(), 2);
        assert!(!table_exists(&db, "a"));

        migrator.run().unwrap();
        assert!(migrator.pending().unwrap().is_empty());
    }

    #[test]
    fn load_error_fails_run_before_any_script() {
        let db = db();
        let migrator = migrator(
            &db,
            &[
                ("001_a.sql", "CREATE TABLE a (id INTEGER);"),
                ("bogus.sql", "SELECT 1;"),
            ],
        );

        let err = migrator.run().unwrap_err();
        assert!(matches!(err, Error::Load(_)));
        assert!(!table_exists(&db, "a"));
    }

    #[test]
    fn bundled_migrations_create_sensor_schema() {
        let db = db();
        let migrator = Migrator::new(db.clone());
        let report = migrator.run().unwrap();

        assert_eq!(report.versions(), ["001", "002"]);
        assert!(table_exists(&db, "sensors"));
        assert!(migrator.run().unwrap().is_noop());
    }
}
