use std::path::Path;

use chrono::Utc;
use rusqlite::Connection;
use tidemark_types::{
    ClassificationResult, ConfidenceTier, FileRecord, MigrationBatch, MigrationLogEntry,
    MigrationPhase, MigrationStatus, ScanBatch,
};

use crate::queries::{classification, file, lease, migration, scan};
use crate::schema;
use crate::{Error, Result};

/// Aggregate counters for the `status` view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexStats {
    pub file_count: u64,
    pub dir_count: u64,
    pub total_size_bytes: u64,
    pub classified_count: u64,
    pub last_scan: Option<ScanBatch>,
}

/// Owned handle over the SQLite store. One connection per process;
/// cross-process exclusion goes through the write lease, not SQLite
/// locking.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

/// Holds the single write lease while in scope. Dropping the guard
/// releases the lease; a crashed process leaves a stale row that
/// `clear_lease` removes explicitly.
#[derive(Debug)]
pub struct WriteLease<'a> {
    db: &'a Database,
}

impl Drop for WriteLease<'_> {
    fn drop(&mut self) {
        let _ = lease::release(&self.db.conn);
    }
}

fn now_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

impl Database {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        schema::init_schema(&db.conn)?;
        Ok(db)
    }

    // --- files ---

    /// Upsert a batch of records in one transaction. Returns how many
    /// rows actually changed.
    pub fn upsert_files(&self, files: &[FileRecord]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut changed = 0;
        for record in files {
            if file::upsert(&tx, record)? {
                changed += 1;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    pub fn get_file(&self, path: &str) -> Result<Option<FileRecord>> {
        file::get(&self.conn, path)
    }

    pub fn all_files(&self, include_dirs: bool) -> Result<Vec<FileRecord>> {
        file::all(&self.conn, include_dirs)
    }

    pub fn files_under_prefix(&self, prefix: &str) -> Result<Vec<FileRecord>> {
        file::under_prefix(&self.conn, prefix)
    }

    pub fn dirs_under_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        file::dirs_under_prefix(&self.conn, prefix)
    }

    pub fn files_by_hash(&self, content_hash: &str) -> Result<Vec<FileRecord>> {
        file::by_hash(&self.conn, content_hash)
    }

    pub fn duplicate_groups(&self) -> Result<Vec<(String, Vec<FileRecord>)>> {
        file::duplicate_groups(&self.conn)
    }

    pub fn empty_directories(&self) -> Result<Vec<FileRecord>> {
        file::empty_directories(&self.conn)
    }

    pub fn files_larger_than(&self, threshold_bytes: i64) -> Result<Vec<FileRecord>> {
        file::larger_than(&self.conn, threshold_bytes)
    }

    pub fn files_modified_before(&self, cutoff: &str) -> Result<Vec<FileRecord>> {
        file::modified_before(&self.conn, cutoff)
    }

    pub fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        file::move_path(&self.conn, source, destination)
    }

    /// Remove records and write the audit rows in the same transaction,
    /// so the deletion log never disagrees with the index.
    pub fn delete_files(&self, paths: &[String], reason: &str, job: &str) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted_at = now_utc();
        let mut removed = 0;
        for path in paths {
            let size = file::get(&tx, path)?.map(|r| r.size_bytes).unwrap_or(0);
            if file::delete(&tx, path)? {
                tx.execute(
                    r#"
                    INSERT INTO deletion_log (path, size_bytes, reason, job, deleted_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    "#,
                    rusqlite::params![path, size, reason, job, &deleted_at],
                )?;
                removed += 1;
            }
        }
        tx.commit()?;
        Ok(removed)
    }

    // --- classifications ---

    pub fn save_classifications(&self, results: &[ClassificationResult]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        for result in results {
            classification::save(&tx, result)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn classification_for(&self, path: &str) -> Result<Option<ClassificationResult>> {
        classification::get(&self.conn, path)
    }

    pub fn all_classifications(&self) -> Result<Vec<ClassificationResult>> {
        classification::all(&self.conn)
    }

    pub fn classifications_by_tier(&self, tier: ConfidenceTier) -> Result<Vec<ClassificationResult>> {
        classification::by_tier(&self.conn, tier)
    }

    pub fn unclassified_paths(&self) -> Result<Vec<String>> {
        classification::unclassified_paths(&self.conn)
    }

    // --- scans ---

    pub fn record_scan_start(&self, batch: &ScanBatch) -> Result<()> {
        scan::record_start(&self.conn, batch)
    }

    pub fn finish_scan(&self, batch: &ScanBatch) -> Result<()> {
        scan::finalize(&self.conn, batch)
    }

    pub fn scan_batches(&self, limit: usize) -> Result<Vec<ScanBatch>> {
        scan::list(&self.conn, limit)
    }

    pub fn last_complete_scan(&self) -> Result<Option<ScanBatch>> {
        scan::last_complete(&self.conn)
    }

    // --- migrations ---

    pub fn create_migration_batch(&self, batch_id: &str, created_at: &str) -> Result<()> {
        migration::create_batch(&self.conn, batch_id, created_at)
    }

    pub fn migration_batch(&self, batch_id: &str) -> Result<Option<MigrationBatch>> {
        migration::get_batch(&self.conn, batch_id)
    }

    pub fn migration_batches(&self) -> Result<Vec<MigrationBatch>> {
        migration::list_batches(&self.conn)
    }

    pub fn complete_migration_phase(&self, batch_id: &str, phase: MigrationPhase) -> Result<()> {
        migration::complete_phase(&self.conn, batch_id, phase)
    }

    pub fn append_migration_log(
        &self,
        batch_id: &str,
        phase: MigrationPhase,
        source_path: &str,
        destination_path: &str,
        status: MigrationStatus,
    ) -> Result<i64> {
        migration::append_entry(&self.conn, batch_id, phase, source_path, destination_path, status)
    }

    pub fn update_migration_status(
        &self,
        entry_id: i64,
        status: MigrationStatus,
        error: Option<&str>,
        applied_at: Option<&str>,
    ) -> Result<()> {
        migration::update_status(&self.conn, entry_id, status, error, applied_at)
    }

    pub fn migration_entries(&self, batch_id: &str) -> Result<Vec<MigrationLogEntry>> {
        migration::entries_for_batch(&self.conn, batch_id)
    }

    pub fn applied_entries_desc(&self, batch_id: &str) -> Result<Vec<MigrationLogEntry>> {
        migration::applied_entries_desc(&self.conn, batch_id)
    }

    // --- lease ---

    pub fn acquire_lease(&self, job: &str) -> Result<WriteLease<'_>> {
        lease::acquire(&self.conn, job, std::process::id(), &now_utc())?;
        Ok(WriteLease { db: self })
    }

    pub fn lease_holder(&self) -> Result<Option<(String, u32, String)>> {
        lease::holder(&self.conn)
    }

    pub fn clear_lease(&self) -> Result<()> {
        lease::release(&self.conn)
    }

    // --- maintenance ---

    pub fn stats(&self) -> Result<IndexStats> {
        let (file_count, total_size_bytes): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM files WHERE is_dir = 0",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let dir_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM files WHERE is_dir = 1", [], |row| {
                    row.get(0)
                })?;
        let classified_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM classifications", [], |row| row.get(0))?;

        Ok(IndexStats {
            file_count: file_count as u64,
            dir_count: dir_count as u64,
            total_size_bytes: total_size_bytes as u64,
            classified_count: classified_count as u64,
            last_scan: scan::last_complete(&self.conn)?,
        })
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute("VACUUM", [])?;
        Ok(())
    }

    pub fn deletion_log(&self, limit: usize) -> Result<Vec<(String, i64, String, String, String)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT path, size_bytes, reason, job, deleted_at
            FROM deletion_log
            ORDER BY id DESC LIMIT ?1
            "#,
        )?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        Ok(rows)
    }
}

impl Database {
    /// Open without creating: missing store is an explicit error so
    /// commands other than `init` never silently start from scratch.
    pub fn open_existing(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(Error::Query(format!(
                "no index store at {}; run `tidemark init` first",
                db_path.display()
            )));
        }
        Self::open(db_path)
    }
}
