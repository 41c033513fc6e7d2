use std::collections::{BTreeSet, HashSet};

use tidemark_index::Database;
use tidemark_remote::{Error as RemoteError, RemoteOps};
use tidemark_types::{
    ClassificationResult, ConfidenceTier, Decision, MigrationPhase, MigrationStatus, Taxonomy,
    is_under, join_path,
};
use uuid::Uuid;

use crate::report::{JobReport, now_utc};
use crate::{Error, Result};

/// One proposed move, shown to the operator in phase 3.
#[derive(Debug, Clone)]
pub struct MoveProposal {
    pub source_path: String,
    pub destination_path: String,
    pub category_path: String,
    pub tier: ConfidenceTier,
    pub reason: String,
}

/// Phase 3 collaborator boundary: something that can answer
/// accept/reject/defer per proposal. The CLI implements this over
/// stdin; tests script it.
pub trait DecisionSource {
    fn decide(&mut self, proposal: &MoveProposal) -> Decision;
}

/// Accepts, rejects, or defers everything. Used for --yes/--defer-all.
pub struct FixedDecision(pub Decision);

impl DecisionSource for FixedDecision {
    fn decide(&mut self, _proposal: &MoveProposal) -> Decision {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MigrateOptions {
    /// Plan and log, but never call the remote or mutate file rows.
    pub dry_run: bool,
}

/// Drives the four-phase migration state machine over the index and a
/// remote. Phase order is enforced from the persisted checkpoint, so an
/// interrupted run resumes exactly where the log says it stopped.
pub struct Migrator<'a> {
    db: &'a Database,
    remote: &'a dyn RemoteOps,
    taxonomy: &'a Taxonomy,
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a Database, remote: &'a dyn RemoteOps, taxonomy: &'a Taxonomy) -> Self {
        Self {
            db,
            remote,
            taxonomy,
        }
    }

    /// Moves implied by the current active classifications. Files
    /// already in place, in frozen subtrees, or with a frozen target
    /// are excluded.
    pub fn plan(&self) -> Result<Vec<MoveProposal>> {
        let mut proposals = Vec::new();
        for result in self.db.all_classifications()? {
            let Some(file) = self.db.get_file(&result.path)? else {
                continue;
            };
            if file.is_dir
                || is_under(&file.path, &result.category_path)
                || self.taxonomy.is_frozen(&file.path)
                || self.taxonomy.is_frozen(&result.category_path)
            {
                continue;
            }
            proposals.push(MoveProposal {
                destination_path: join_path(&result.category_path, file.file_name()),
                source_path: result.path,
                category_path: result.category_path,
                tier: result.tier,
                reason: result.reason,
            });
        }
        Ok(proposals)
    }

    pub fn start_batch(&self) -> Result<String> {
        let batch_id = Uuid::new_v4().to_string();
        self.db.create_migration_batch(&batch_id, &now_utc())?;
        Ok(batch_id)
    }

    /// Run one phase. Refuses any phase other than the one following
    /// the batch's persisted checkpoint.
    pub fn run_phase(
        &self,
        batch_id: &str,
        phase: MigrationPhase,
        decisions: &mut dyn DecisionSource,
        opts: MigrateOptions,
    ) -> Result<JobReport> {
        let batch = self
            .db
            .migration_batch(batch_id)?
            .ok_or_else(|| Error::Job(format!("unknown migration batch: {}", batch_id)))?;
        let expected = match batch.last_completed_phase {
            None => MigrationPhase::Structure,
            Some(last) => last.next().ok_or_else(|| {
                Error::Job(format!("batch {} already completed all phases", batch_id))
            })?,
        };
        if phase != expected {
            return Err(Error::Job(format!(
                "phase {} out of order: batch {} expects {}",
                phase.label(),
                batch_id,
                expected.label()
            )));
        }

        let mut report = JobReport::new(format!("migrate:{}", phase.label()));
        match phase {
            MigrationPhase::Structure => self.phase_structure(opts, &mut report)?,
            MigrationPhase::AutoMigrate => {
                let proposals = self.plan()?;
                let high: Vec<_> = proposals
                    .into_iter()
                    .filter(|p| p.tier == ConfidenceTier::High)
                    .collect();
                self.apply_moves(batch_id, phase, &high, opts, &mut report)?;
            }
            MigrationPhase::ReviewMigrate => {
                let proposals = self.plan()?;
                let mut accepted = Vec::new();
                for proposal in proposals
                    .into_iter()
                    .filter(|p| p.tier != ConfidenceTier::High)
                {
                    match decisions.decide(&proposal) {
                        Decision::Accept => accepted.push(proposal),
                        Decision::Reject => report.bump("rejected", 1),
                        Decision::Defer => report.bump("deferred", 1),
                    }
                }
                self.apply_moves(batch_id, phase, &accepted, opts, &mut report)?;
            }
            MigrationPhase::Cleanup => self.phase_cleanup(batch_id, opts, &mut report)?,
        }

        if !opts.dry_run {
            self.db.complete_migration_phase(batch_id, phase)?;
        }
        report.finish();
        Ok(report)
    }

    /// Phase 1: create every destination directory implied by the
    /// active classifications plus the configured taxonomy. Existing
    /// directories are a no-op.
    fn phase_structure(&self, opts: MigrateOptions, report: &mut JobReport) -> Result<()> {
        let mut dirs: BTreeSet<String> = self
            .taxonomy
            .all_paths()
            .into_iter()
            .filter(|p| !self.taxonomy.is_frozen(p))
            .collect();
        for result in self.db.all_classifications()? {
            if !self.taxonomy.is_frozen(&result.category_path) {
                dirs.insert(result.category_path);
            }
        }

        for dir in dirs {
            if !opts.dry_run {
                self.remote.create_dir(&dir).map_err(Error::Remote)?;
                let mut record = tidemark_types::FileRecord::new(&dir, 0, true);
                record.scanned_at = Some(now_utc());
                self.db.upsert_files(&[record])?;
            }
            report.bump("dirs_ensured", 1);
        }
        Ok(())
    }

    /// Plan-then-apply for one set of proposals. Two proposals racing
    /// for the same destination resolve first-come-first-served; the
    /// loser is marked failed, never silently overwritten.
    fn apply_moves(
        &self,
        batch_id: &str,
        phase: MigrationPhase,
        proposals: &[MoveProposal],
        opts: MigrateOptions,
        report: &mut JobReport,
    ) -> Result<()> {
        let mut entry_ids = Vec::with_capacity(proposals.len());
        for p in proposals {
            let id = self.db.append_migration_log(
                batch_id,
                phase,
                &p.source_path,
                &p.destination_path,
                MigrationStatus::Planned,
            )?;
            entry_ids.push(id);
            report.bump("planned", 1);
        }
        if opts.dry_run {
            return Ok(());
        }

        let mut claimed: HashSet<String> = HashSet::new();
        for (p, entry_id) in proposals.iter().zip(entry_ids) {
            if !claimed.insert(p.destination_path.clone()) {
                self.db.update_migration_status(
                    entry_id,
                    MigrationStatus::Failed,
                    Some("destination claimed by an earlier move"),
                    Some(&now_utc()),
                )?;
                report.add_failure(&p.source_path, "destination claimed by an earlier move");
                continue;
            }

            match self.remote.move_entry(&p.source_path, &p.destination_path) {
                Ok(()) => {
                    self.db.move_file(&p.source_path, &p.destination_path)?;
                    self.db.update_migration_status(
                        entry_id,
                        MigrationStatus::Applied,
                        None,
                        Some(&now_utc()),
                    )?;
                    report.bump("applied", 1);
                }
                Err(err) => {
                    let msg = err.to_string();
                    self.db.update_migration_status(
                        entry_id,
                        MigrationStatus::Failed,
                        Some(&msg),
                        Some(&now_utc()),
                    )?;
                    report.add_failure(&p.source_path, &msg);
                }
            }
        }
        Ok(())
    }

    /// Phase 4: delete source directories this batch emptied. The index
    /// is re-checked per directory; anything still holding a file,
    /// touched by this run or not, stays.
    fn phase_cleanup(
        &self,
        batch_id: &str,
        opts: MigrateOptions,
        report: &mut JobReport,
    ) -> Result<()> {
        let mut sources: BTreeSet<String> = BTreeSet::new();
        for entry in self.db.migration_entries(batch_id)? {
            if entry.status == MigrationStatus::Applied {
                let (parent, _) = tidemark_types::split_path(&entry.source_path);
                if parent != "/" {
                    sources.insert(parent);
                }
            }
        }

        // Deepest first, so an emptied chain collapses bottom-up.
        let mut sources: Vec<String> = sources.into_iter().collect();
        sources.sort_by_key(|d| std::cmp::Reverse(tidemark_types::path_depth(d)));

        for dir in sources {
            if !self.db.files_under_prefix(&dir)?.is_empty() {
                report.bump("kept_nonempty", 1);
                continue;
            }
            if opts.dry_run {
                report.bump("would_remove", 1);
                continue;
            }
            match self.remote.delete(&dir) {
                Ok(()) | Err(RemoteError::NotFound(_)) => {
                    // The remote delete is recursive, so any file-empty
                    // subdirectory rows go with their parent.
                    let mut rows = self.db.dirs_under_prefix(&dir)?;
                    rows.push(dir);
                    report.bump("removed_dirs", rows.len() as u64);
                    self.db
                        .delete_files(&rows, "emptied by migration", "migrate")?;
                }
                Err(err) => report.add_failure(&dir, err.to_string()),
            }
        }
        Ok(())
    }

    /// Reverse every applied entry of a batch, newest first. Occupied
    /// rollback targets are recorded and skipped; the report carries
    /// the completion ratio. Re-running on a rolled-back batch is a
    /// no-op because reversed entries are no longer `Applied`.
    pub fn rollback(&self, batch_id: &str, opts: MigrateOptions) -> Result<JobReport> {
        self.db
            .migration_batch(batch_id)?
            .ok_or_else(|| Error::Job(format!("unknown migration batch: {}", batch_id)))?;

        let mut report = JobReport::new("rollback");
        let entries = self.db.applied_entries_desc(batch_id)?;
        report.bump("applied_total", entries.len() as u64);

        for entry in entries {
            if opts.dry_run {
                report.bump("would_reverse", 1);
                continue;
            }
            match self
                .remote
                .move_entry(&entry.destination_path, &entry.source_path)
            {
                Ok(()) => {
                    self.db
                        .move_file(&entry.destination_path, &entry.source_path)?;
                    self.db.update_migration_status(
                        entry.id,
                        MigrationStatus::RolledBack,
                        None,
                        Some(&now_utc()),
                    )?;
                    report.bump("rolled_back", 1);
                }
                Err(err) => {
                    report.add_failure(&entry.destination_path, err.to_string());
                }
            }
        }
        report.finish();
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidemark_index::Database;
    use tidemark_testing::{MemoryRemote, fixtures};
    use tidemark_types::FileRecord;

    struct ScriptedDecisions(Vec<Decision>);

    impl DecisionSource for ScriptedDecisions {
        fn decide(&mut self, _proposal: &MoveProposal) -> Decision {
            if self.0.is_empty() {
                Decision::Defer
            } else {
                self.0.remove(0)
            }
        }
    }

    fn classification(path: &str, category: &str, tier: ConfidenceTier) -> ClassificationResult {
        ClassificationResult {
            path: path.to_string(),
            category_path: category.to_string(),
            tier,
            rule_matched: "directory_mapping".to_string(),
            reason: String::new(),
            classified_at: Some("2026-01-01T00:00:00Z".to_string()),
        }
    }

    fn seed(db: &Database, remote: &MemoryRemote, path: &str, content: &[u8]) {
        remote.add_file(path, content);
        let mut rec = FileRecord::new(path, content.len() as i64, false);
        rec.scanned_at = Some("2026-01-01T00:00:00Z".to_string());
        db.upsert_files(&[rec]).unwrap();
        let (parent, _) = tidemark_types::split_path(path);
        if parent != "/" {
            db.upsert_files(&[FileRecord::new(parent, 0, true)]).unwrap();
        }
    }

    fn run_to_phase(
        migrator: &Migrator,
        batch_id: &str,
        through: MigrationPhase,
    ) -> Result<JobReport> {
        let mut last = None;
        for n in 1..=through.number() {
            let phase = MigrationPhase::from_number(n).unwrap();
            last = Some(migrator.run_phase(
                batch_id,
                phase,
                &mut FixedDecision(Decision::Defer),
                MigrateOptions::default(),
            )?);
        }
        Ok(last.unwrap())
    }

    #[test]
    fn test_phase_order_enforced() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        let migrator = Migrator::new(&db, &remote, &taxonomy);

        let batch_id = migrator.start_batch()?;
        let err = migrator
            .run_phase(
                &batch_id,
                MigrationPhase::AutoMigrate,
                &mut FixedDecision(Decision::Defer),
                MigrateOptions::default(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("out of order"));
        Ok(())
    }

    #[test]
    fn test_auto_migrate_moves_high_tier_only() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/tax.pdf", b"t");
        seed(&db, &remote, "/Inbox/maybe.txt", b"m");
        db.save_classifications(&[
            classification("/Inbox/tax.pdf", "/Docs/Finance", ConfidenceTier::High),
            classification("/Inbox/maybe.txt", "/Docs", ConfidenceTier::Medium),
        ])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        let report = run_to_phase(&migrator, &batch_id, MigrationPhase::AutoMigrate)?;

        assert_eq!(report.count("applied"), 1);
        assert!(remote.contains("/Docs/Finance/tax.pdf"));
        assert!(remote.contains("/Inbox/maybe.txt"));
        assert!(db.get_file("/Docs/Finance/tax.pdf")?.is_some());
        assert!(db.get_file("/Inbox/tax.pdf")?.is_none());
        Ok(())
    }

    #[test]
    fn test_occupied_destination_fails_entry_not_batch() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/tax.pdf", b"new");
        seed(&db, &remote, "/Inbox/other.pdf", b"o");
        // Unrelated file already sits at the destination.
        remote.add_file("/Docs/Finance/tax.pdf", b"old");
        db.save_classifications(&[
            classification("/Inbox/tax.pdf", "/Docs/Finance", ConfidenceTier::High),
            classification("/Inbox/other.pdf", "/Docs/Legal", ConfidenceTier::High),
        ])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        let report = run_to_phase(&migrator, &batch_id, MigrationPhase::AutoMigrate)?;

        assert_eq!(report.count("applied"), 1);
        assert_eq!(report.count("failed"), 1);
        // The occupant was not overwritten.
        assert_eq!(remote.content_of("/Docs/Finance/tax.pdf").unwrap(), b"old");

        let failed: Vec<_> = db
            .migration_entries(&batch_id)?
            .into_iter()
            .filter(|e| e.status == MigrationStatus::Failed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source_path, "/Inbox/tax.pdf");
        Ok(())
    }

    #[test]
    fn test_review_phase_honors_decisions() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/a.txt", b"a");
        seed(&db, &remote, "/Inbox/b.txt", b"b");
        seed(&db, &remote, "/Inbox/c.txt", b"c");
        db.save_classifications(&[
            classification("/Inbox/a.txt", "/Docs", ConfidenceTier::Medium),
            classification("/Inbox/b.txt", "/Docs", ConfidenceTier::Medium),
            classification("/Inbox/c.txt", "/Media", ConfidenceTier::Low),
        ])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        run_to_phase(&migrator, &batch_id, MigrationPhase::AutoMigrate)?;
        let mut decisions =
            ScriptedDecisions(vec![Decision::Accept, Decision::Reject, Decision::Defer]);
        let report = migrator.run_phase(
            &batch_id,
            MigrationPhase::ReviewMigrate,
            &mut decisions,
            MigrateOptions::default(),
        )?;

        assert_eq!(report.count("applied"), 1);
        assert_eq!(report.count("rejected"), 1);
        assert_eq!(report.count("deferred"), 1);
        assert!(remote.contains("/Docs/a.txt"));
        assert!(remote.contains("/Inbox/b.txt"));
        assert!(remote.contains("/Inbox/c.txt"));
        Ok(())
    }

    #[test]
    fn test_cleanup_removes_emptied_dir_keeps_occupied_sibling() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/Old/tax.pdf", b"t");
        seed(&db, &remote, "/Inbox/Keep/stay.txt", b"s");
        db.save_classifications(&[classification(
            "/Inbox/Old/tax.pdf",
            "/Docs/Finance",
            ConfidenceTier::High,
        )])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        run_to_phase(&migrator, &batch_id, MigrationPhase::Cleanup)?;

        assert!(!remote.contains("/Inbox/Old"));
        assert!(remote.contains("/Inbox/Keep"));
        assert!(remote.contains("/Inbox/Keep/stay.txt"));
        assert!(db.get_file("/Inbox/Old")?.is_none());
        Ok(())
    }

    #[test]
    fn test_cleanup_drops_rows_of_nested_empty_subdirs() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/Old/tax.pdf", b"t");
        // File-empty subdirectory that only exists as structure.
        remote.add_dir("/Inbox/Old/Drafts");
        db.upsert_files(&[FileRecord::new("/Inbox/Old/Drafts", 0, true)])?;
        db.save_classifications(&[classification(
            "/Inbox/Old/tax.pdf",
            "/Docs/Finance",
            ConfidenceTier::High,
        )])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        let report = run_to_phase(&migrator, &batch_id, MigrationPhase::Cleanup)?;

        assert!(!remote.contains("/Inbox/Old"));
        assert!(!remote.contains("/Inbox/Old/Drafts"));
        // No stale index row survives for the nested directory either.
        assert!(db.get_file("/Inbox/Old/Drafts")?.is_none());
        assert!(db.get_file("/Inbox/Old")?.is_none());
        assert_eq!(report.count("removed_dirs"), 2);
        Ok(())
    }

    #[test]
    fn test_rollback_reverses_applied_only_and_is_idempotent() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/tax.pdf", b"t");
        seed(&db, &remote, "/Inbox/receipt.pdf", b"r");
        db.save_classifications(&[
            classification("/Inbox/tax.pdf", "/Docs/Finance", ConfidenceTier::High),
            classification("/Inbox/receipt.pdf", "/Docs/Finance", ConfidenceTier::High),
        ])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        run_to_phase(&migrator, &batch_id, MigrationPhase::AutoMigrate)?;
        // One entry stays planned forever.
        db.append_migration_log(
            &batch_id,
            MigrationPhase::AutoMigrate,
            "/Inbox/never.txt",
            "/Docs/never.txt",
            MigrationStatus::Planned,
        )?;

        let report = migrator.rollback(&batch_id, MigrateOptions::default())?;
        assert_eq!(report.count("rolled_back"), 2);
        assert!(remote.contains("/Inbox/tax.pdf"));
        assert!(remote.contains("/Inbox/receipt.pdf"));
        assert!(db.get_file("/Inbox/tax.pdf")?.is_some());

        let again = migrator.rollback(&batch_id, MigrateOptions::default())?;
        assert_eq!(again.count("rolled_back"), 0);
        assert_eq!(again.count("applied_total"), 0);
        Ok(())
    }

    #[test]
    fn test_rollback_skips_occupied_target_and_continues() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/a.pdf", b"a");
        seed(&db, &remote, "/Inbox/b.pdf", b"b");
        db.save_classifications(&[
            classification("/Inbox/a.pdf", "/Docs/Finance", ConfidenceTier::High),
            classification("/Inbox/b.pdf", "/Docs/Legal", ConfidenceTier::High),
        ])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        run_to_phase(&migrator, &batch_id, MigrationPhase::AutoMigrate)?;
        // Someone re-occupied one original location.
        remote.add_file("/Inbox/a.pdf", b"squatter");

        let report = migrator.rollback(&batch_id, MigrateOptions::default())?;
        assert_eq!(report.count("rolled_back"), 1);
        assert_eq!(report.count("failed"), 1);
        assert!(remote.contains("/Inbox/b.pdf"));
        Ok(())
    }

    #[test]
    fn test_dry_run_logs_plans_without_touching_remote() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let taxonomy = fixtures::sample_taxonomy();
        seed(&db, &remote, "/Inbox/tax.pdf", b"t");
        db.save_classifications(&[classification(
            "/Inbox/tax.pdf",
            "/Docs/Finance",
            ConfidenceTier::High,
        )])?;

        let migrator = Migrator::new(&db, &remote, &taxonomy);
        let batch_id = migrator.start_batch()?;
        migrator.run_phase(
            &batch_id,
            MigrationPhase::Structure,
            &mut FixedDecision(Decision::Defer),
            MigrateOptions { dry_run: true },
        )?;
        let report = migrator.run_phase(
            &batch_id,
            MigrationPhase::Structure,
            &mut FixedDecision(Decision::Defer),
            MigrateOptions::default(),
        )?;
        assert!(report.count("dirs_ensured") > 0);

        let report = migrator.run_phase(
            &batch_id,
            MigrationPhase::AutoMigrate,
            &mut FixedDecision(Decision::Defer),
            MigrateOptions { dry_run: true },
        )?;
        assert_eq!(report.count("planned"), 1);
        assert_eq!(report.count("applied"), 0);
        assert!(remote.contains("/Inbox/tax.pdf"));
        assert!(remote.moves().is_empty());

        // Dry-run did not advance the checkpoint.
        let batch = db.migration_batch(&batch_id)?.unwrap();
        assert_eq!(batch.last_completed_phase, Some(MigrationPhase::Structure));
        Ok(())
    }
}
