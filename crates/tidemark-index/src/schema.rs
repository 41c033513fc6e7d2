use rusqlite::Connection;

use crate::{Error, Result};

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 3;

// NOTE: Store Design Rationale
//
// Why one `files` table for files AND directories?
// - Empty-directory cleanup (migration phase 4) must be answerable locally,
//   without a remote round trip
// - Directory rows cost little and keep parent_dir joins trivial
//
// Why WAL journal mode?
// - Scans upsert tens of thousands of rows while status queries read
// - A crash mid-write must leave pre-write or post-write state, never torn
//
// Why append-only migration_log with status columns?
// - The log is the rollback plan: reversing a batch reads nothing else
// - Deleting rows would destroy the audit trail; status moves forward only

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| Error::Corrupt(format!("cannot read schema version: {}", e)))?;

    if current_version != 0 && current_version != SCHEMA_VERSION {
        return Err(Error::Corrupt(format!(
            "schema version {} does not match supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS files (
            path          TEXT PRIMARY KEY,
            remote_id     TEXT,
            content_hash  TEXT,
            size_bytes    INTEGER NOT NULL DEFAULT 0,
            modified_time TEXT,
            is_dir        BOOLEAN NOT NULL DEFAULT 0,
            extension     TEXT NOT NULL DEFAULT '',
            parent_dir    TEXT NOT NULL DEFAULT '/',
            scanned_at    TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_files_hash ON files(content_hash);
        CREATE INDEX IF NOT EXISTS idx_files_ext ON files(extension);
        CREATE INDEX IF NOT EXISTS idx_files_parent ON files(parent_dir);
        CREATE INDEX IF NOT EXISTS idx_files_size ON files(size_bytes);

        CREATE TABLE IF NOT EXISTS scan_batches (
            id          TEXT PRIMARY KEY,
            root        TEXT NOT NULL,
            started_at  TEXT NOT NULL,
            finished_at TEXT,
            discovered  INTEGER NOT NULL DEFAULT 0,
            updated     INTEGER NOT NULL DEFAULT 0,
            errored     INTEGER NOT NULL DEFAULT 0,
            complete    BOOLEAN NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS classifications (
            path          TEXT PRIMARY KEY,
            category_path TEXT NOT NULL,
            tier          TEXT NOT NULL,
            rule_matched  TEXT NOT NULL,
            reason        TEXT NOT NULL DEFAULT '',
            classified_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_class_tier ON classifications(tier);
        CREATE INDEX IF NOT EXISTS idx_class_category ON classifications(category_path);

        CREATE TABLE IF NOT EXISTS migration_batches (
            batch_id             TEXT PRIMARY KEY,
            created_at           TEXT NOT NULL,
            last_completed_phase INTEGER
        );

        CREATE TABLE IF NOT EXISTS migration_log (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            batch_id         TEXT NOT NULL,
            phase            INTEGER NOT NULL,
            source_path      TEXT NOT NULL,
            destination_path TEXT NOT NULL,
            status           TEXT NOT NULL,
            error            TEXT,
            applied_at       TEXT,
            FOREIGN KEY (batch_id) REFERENCES migration_batches(batch_id)
        );

        CREATE INDEX IF NOT EXISTS idx_migration_batch ON migration_log(batch_id);
        CREATE INDEX IF NOT EXISTS idx_migration_status ON migration_log(status);

        CREATE TABLE IF NOT EXISTS deletion_log (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            path       TEXT NOT NULL,
            size_bytes INTEGER NOT NULL DEFAULT 0,
            reason     TEXT NOT NULL,
            job        TEXT NOT NULL,
            deleted_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS leases (
            id          INTEGER PRIMARY KEY CHECK (id = 1),
            job         TEXT NOT NULL,
            pid         INTEGER NOT NULL,
            acquired_at TEXT NOT NULL
        );
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}
