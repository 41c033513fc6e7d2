use std::collections::HashSet;

use tidemark_index::Database;
use tidemark_remote::RemoteOps;
use tidemark_types::{DuplicateGroup, FileRecord, RiskTier, Taxonomy, is_under};

use crate::config::GovernanceConfig;
use crate::report::JobReport;
use crate::{Error, Result};

/// Tier boundaries are policy, not fact; operators tune them in config.
#[derive(Debug, Clone)]
pub struct DedupPolicy {
    pub exclude_dirs: Vec<String>,
    pub manual_size_threshold: i64,
}

impl DedupPolicy {
    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self {
            exclude_dirs: config.dedup.exclude_dirs.clone(),
            manual_size_threshold: (config.dedup.manual_size_threshold_mb as i64) * 1024 * 1024,
        }
    }
}

/// Groups byte-identical files and proposes removals tiered by risk.
///
/// The survivor is chosen before candidates exist, so no tier can ever
/// strand a hash group at zero copies.
pub struct Deduplicator<'a> {
    db: &'a Database,
}

impl<'a> Deduplicator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn report(&self, taxonomy: &Taxonomy, policy: &DedupPolicy) -> Result<Vec<DuplicateGroup>> {
        let mut groups = Vec::new();
        for (hash, files) in self.db.duplicate_groups()? {
            let files: Vec<FileRecord> = files
                .into_iter()
                .filter(|f| !policy.exclude_dirs.iter().any(|d| is_under(&f.path, d)))
                .collect();
            if files.len() < 2 {
                continue;
            }

            let tier = self.assess(&files, taxonomy, policy)?;
            let survivor = select_survivor(&files, taxonomy);
            let candidates = if tier == RiskTier::Manual {
                // Manual groups are surfaced for a human, never given
                // pre-picked removal candidates.
                Vec::new()
            } else {
                files
                    .iter()
                    .filter(|f| f.path != survivor.path)
                    .cloned()
                    .collect()
            };

            groups.push(DuplicateGroup {
                content_hash: hash,
                size_bytes: survivor.size_bytes,
                tier,
                survivor,
                candidates,
            });
        }
        Ok(groups)
    }

    fn assess(
        &self,
        files: &[FileRecord],
        _taxonomy: &Taxonomy,
        policy: &DedupPolicy,
    ) -> Result<RiskTier> {
        if files.iter().any(|f| f.size_bytes >= policy.manual_size_threshold) {
            return Ok(RiskTier::Manual);
        }
        // Same hash but disagreeing sizes means the index is stale or
        // the remote lied; a human sorts that out.
        let sizes: HashSet<i64> = files.iter().map(|f| f.size_bytes).collect();
        if sizes.len() > 1 {
            return Ok(RiskTier::Manual);
        }

        let names: HashSet<&str> = files.iter().map(|f| f.file_name()).collect();
        let mut categories: HashSet<String> = HashSet::new();
        for f in files {
            let category = match self.db.classification_for(&f.path)? {
                Some(c) => c.category_path,
                None => f.parent_dir.clone(),
            };
            categories.insert(category);
        }

        // Distinct filenames suggest distinct intent; crossing category
        // boundaries is always at least a review.
        if names.len() == 1 && categories.len() == 1 {
            Ok(RiskTier::Safe)
        } else {
            Ok(RiskTier::Review)
        }
    }

    /// Delete candidates of every group at or below `max_tier`. Remote
    /// delete first, then the index row plus its audit entry; survivors
    /// are untouchable by construction.
    pub fn apply(
        &self,
        remote: &dyn RemoteOps,
        groups: &[DuplicateGroup],
        max_tier: RiskTier,
        dry_run: bool,
    ) -> Result<JobReport> {
        if max_tier == RiskTier::Manual {
            return Err(Error::Job(
                "manual-tier groups cannot be applied in bulk".to_string(),
            ));
        }

        let mut report = JobReport::new("dedup");
        for group in groups.iter().filter(|g| g.tier <= max_tier) {
            for candidate in &group.candidates {
                if dry_run {
                    report.bump("would_remove", 1);
                    report.bump("would_reclaim_bytes", group.size_bytes as u64);
                    continue;
                }
                match remote.delete(&candidate.path) {
                    Ok(()) => {
                        self.db.delete_files(
                            std::slice::from_ref(&candidate.path),
                            &format!("duplicate of {}", group.survivor.path),
                            "dedup",
                        )?;
                        report.bump("removed", 1);
                        report.bump("reclaimed_bytes", group.size_bytes as u64);
                    }
                    Err(err) => report.add_failure(&candidate.path, err.to_string()),
                }
            }
        }
        report.finish();
        Ok(report)
    }
}

/// Survivor heuristic: prefer a copy already under a taxonomy category,
/// then the shortest path, then the newest mtime, then lexicographic
/// for a stable result.
fn select_survivor(files: &[FileRecord], taxonomy: &Taxonomy) -> FileRecord {
    files
        .iter()
        .min_by(|a, b| {
            let a_tax = !taxonomy.contains_path(&a.path);
            let b_tax = !taxonomy.contains_path(&b.path);
            a_tax
                .cmp(&b_tax)
                .then(a.path.len().cmp(&b.path.len()))
                .then(b.modified_time.cmp(&a.modified_time))
                .then(a.path.cmp(&b.path))
        })
        .expect("duplicate group is non-empty")
        .clone()
}
