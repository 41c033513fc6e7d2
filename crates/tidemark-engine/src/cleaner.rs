use chrono::{Duration, Utc};
use serde::Serialize;
use tidemark_index::Database;
use tidemark_remote::{Error as RemoteError, RemoteOps};
use tidemark_types::{DuplicateGroup, FileRecord, RiskTier, Taxonomy};

use crate::config::GovernanceConfig;
use crate::dedup::{DedupPolicy, Deduplicator};
use crate::report::JobReport;
use crate::Result;

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub large_threshold_bytes: i64,
    pub expire_days: i64,
}

impl CleanOptions {
    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self {
            large_threshold_bytes: (config.clean.large_file_threshold_mb as i64) * 1024 * 1024,
            expire_days: config.clean.expire_days,
        }
    }
}

/// What a clean pass could reclaim. Large and expired files are
/// reported for a human; only safe duplicates and empty directories
/// are ever deleted automatically.
#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub duplicate_reclaimable_bytes: i64,
    pub large_files: Vec<FileRecord>,
    pub expired_files: Vec<FileRecord>,
    pub empty_dirs: Vec<FileRecord>,
}

pub struct Cleaner<'a> {
    db: &'a Database,
}

impl<'a> Cleaner<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn report(
        &self,
        taxonomy: &Taxonomy,
        policy: &DedupPolicy,
        opts: &CleanOptions,
    ) -> Result<CleanReport> {
        let duplicate_groups = Deduplicator::new(self.db).report(taxonomy, policy)?;
        let duplicate_reclaimable_bytes =
            duplicate_groups.iter().map(|g| g.reclaimable()).sum();

        let cutoff = (Utc::now() - Duration::days(opts.expire_days))
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        Ok(CleanReport {
            duplicate_groups,
            duplicate_reclaimable_bytes,
            large_files: self.db.files_larger_than(opts.large_threshold_bytes)?,
            expired_files: self.db.files_modified_before(&cutoff)?,
            empty_dirs: self.db.empty_directories()?,
        })
    }

    /// Delete safe-tier duplicate candidates and empty directories.
    pub fn apply(
        &self,
        remote: &dyn RemoteOps,
        clean: &CleanReport,
        dry_run: bool,
    ) -> Result<JobReport> {
        let mut report = JobReport::new("clean");

        let safe_groups = clean
            .duplicate_groups
            .iter()
            .filter(|g| g.tier == RiskTier::Safe);
        for group in safe_groups {
            for candidate in &group.candidates {
                if dry_run {
                    report.bump("would_remove_duplicates", 1);
                    continue;
                }
                match remote.delete(&candidate.path) {
                    Ok(()) => {
                        self.db.delete_files(
                            std::slice::from_ref(&candidate.path),
                            &format!("duplicate of {}", group.survivor.path),
                            "clean",
                        )?;
                        report.bump("removed_duplicates", 1);
                        report.bump("reclaimed_bytes", group.size_bytes as u64);
                    }
                    Err(err) => report.add_failure(&candidate.path, err.to_string()),
                }
            }
        }

        for dir in &clean.empty_dirs {
            if dry_run {
                report.bump("would_remove_dirs", 1);
                continue;
            }
            match remote.delete(&dir.path) {
                // Already gone remotely is fine; drop the stale row.
                Ok(()) | Err(RemoteError::NotFound(_)) => {
                    self.db
                        .delete_files(std::slice::from_ref(&dir.path), "empty directory", "clean")?;
                    report.bump("removed_dirs", 1);
                }
                Err(err) => report.add_failure(&dir.path, err.to_string()),
            }
        }

        report.bump(
            "large_files_reported",
            clean.large_files.len() as u64,
        );
        report.bump(
            "expired_files_reported",
            clean.expired_files.len() as u64,
        );

        // Compact the store after the deletions it just absorbed.
        if !dry_run {
            self.db.vacuum()?;
            report.bump("vacuumed", 1);
        }
        report.finish();
        Ok(report)
    }
}
