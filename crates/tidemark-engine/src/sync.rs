use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tidemark_index::Database;
use tidemark_remote::RemoteTransfer;
use tidemark_types::{FileRecord, join_path};
use walkdir::WalkDir;

use crate::config::GovernanceConfig;
use crate::report::JobReport;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    /// local -> remote
    Push,
    /// remote -> local
    Pull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Present locally, absent from the indexed remote subtree.
    MissingRemote,
    /// Present in the index, absent locally.
    MissingLocal,
    SizeDiff,
    HashDiff,
}

/// One out-of-sync path. Planning never moves bytes; `execute` hands
/// relevant actions to the transfer collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct SyncAction {
    pub remote_path: String,
    pub local_path: PathBuf,
    pub kind: DiffKind,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub local_root: PathBuf,
    pub remote_prefix: String,
    pub exclude_patterns: Vec<String>,
    pub max_files: usize,
}

impl SyncOptions {
    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self {
            local_root: PathBuf::from(&config.sync.local_root),
            remote_prefix: config.sync.remote_prefix.clone(),
            exclude_patterns: config.sync.exclude_patterns.clone(),
            max_files: config.sync.max_files,
        }
    }
}

/// One-directional reconciliation between a local directory and the
/// indexed remote subtree. Comparison is size first, then content
/// hash; the local file is only hashed when sizes agree and the remote
/// hash is known.
pub struct Syncer<'a> {
    db: &'a Database,
}

impl<'a> Syncer<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn plan(&self, opts: &SyncOptions) -> Result<Vec<SyncAction>> {
        if !opts.local_root.is_dir() {
            return Err(Error::Config(format!(
                "sync local root is not a directory: {}",
                opts.local_root.display()
            )));
        }

        let mut remote: BTreeMap<String, FileRecord> = self
            .db
            .files_under_prefix(&opts.remote_prefix)?
            .into_iter()
            .map(|f| (f.path.clone(), f))
            .collect();

        let mut actions = Vec::new();
        for entry in WalkDir::new(&opts.local_root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if opts.exclude_patterns.iter().any(|p| glob_match(p, &name)) {
                continue;
            }

            let rel = entry
                .path()
                .strip_prefix(&opts.local_root)
                .expect("walkdir stays under root")
                .to_string_lossy()
                .replace('\\', "/");
            let remote_path = join_path(&opts.remote_prefix, &rel);

            match remote.remove(&remote_path) {
                None => actions.push(SyncAction {
                    remote_path,
                    local_path: entry.path().to_path_buf(),
                    kind: DiffKind::MissingRemote,
                }),
                Some(record) => {
                    let local_size = entry.metadata().map(|m| m.len() as i64).unwrap_or(-1);
                    if local_size != record.size_bytes {
                        actions.push(SyncAction {
                            remote_path,
                            local_path: entry.path().to_path_buf(),
                            kind: DiffKind::SizeDiff,
                        });
                    } else if let Some(remote_hash) = &record.content_hash
                        && hash_local(entry.path())? != *remote_hash
                    {
                        actions.push(SyncAction {
                            remote_path,
                            local_path: entry.path().to_path_buf(),
                            kind: DiffKind::HashDiff,
                        });
                    }
                }
            }
        }

        // Whatever the walk did not consume exists only remotely.
        for (path, _) in remote {
            let rel = path
                .strip_prefix(opts.remote_prefix.trim_end_matches('/'))
                .unwrap_or(&path)
                .trim_start_matches('/');
            actions.push(SyncAction {
                local_path: opts.local_root.join(rel),
                remote_path: path,
                kind: DiffKind::MissingLocal,
            });
        }
        Ok(actions)
    }

    /// Drive transfers for the actions this direction can resolve.
    /// Per-item failures aggregate into the report.
    pub fn execute(
        &self,
        transfer: &dyn RemoteTransfer,
        direction: SyncDirection,
        actions: &[SyncAction],
        opts: &SyncOptions,
        dry_run: bool,
    ) -> Result<JobReport> {
        let mut report = JobReport::new(match direction {
            SyncDirection::Push => "sync:push",
            SyncDirection::Pull => "sync:pull",
        });

        let relevant = actions.iter().filter(|a| match direction {
            SyncDirection::Push => a.kind != DiffKind::MissingLocal,
            SyncDirection::Pull => a.kind != DiffKind::MissingRemote,
        });

        for action in relevant.take(opts.max_files) {
            if dry_run {
                report.bump("would_transfer", 1);
                continue;
            }
            let outcome = match direction {
                SyncDirection::Push => transfer.push(&action.local_path, &action.remote_path),
                SyncDirection::Pull => transfer.pull(&action.remote_path, &action.local_path),
            };
            match outcome {
                Ok(()) => report.bump("transferred", 1),
                Err(err) => report.add_failure(&action.remote_path, err.to_string()),
            }
        }
        report.finish();
        Ok(report)
    }
}

fn hash_local(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Minimal '*' glob against a file name. Enough for the ignore
/// patterns sync configs actually use (".*", "*.tmp", "Thumbs.db").
fn glob_match(pattern: &str, name: &str) -> bool {
    fn inner(p: &[u8], n: &[u8]) -> bool {
        match (p.first(), n.first()) {
            (None, None) => true,
            (Some(b'*'), _) => inner(&p[1..], n) || (!n.is_empty() && inner(p, &n[1..])),
            (Some(pc), Some(nc)) if pc == nc => inner(&p[1..], &n[1..]),
            _ => false,
        }
    }
    inner(pattern.as_bytes(), name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tidemark_testing::MemoryRemote;

    fn index_file(db: &Database, path: &str, content: &[u8]) {
        let mut rec = FileRecord::new(path, content.len() as i64, false);
        rec.content_hash = Some(format!("{:x}", Sha256::digest(content)));
        db.upsert_files(&[rec]).unwrap();
    }

    fn opts(root: &Path) -> SyncOptions {
        SyncOptions {
            local_root: root.to_path_buf(),
            remote_prefix: "/Backup".to_string(),
            exclude_patterns: vec![".*".to_string(), "*.tmp".to_string()],
            max_files: 100,
        }
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("*.tmp", "work.tmp"));
        assert!(glob_match(".*", ".hidden"));
        assert!(!glob_match("*.tmp", "work.txt"));
        assert!(glob_match("*", "anything"));
    }

    #[test]
    fn test_plan_flags_each_diff_kind() -> Result<()> {
        let db = Database::open_in_memory()?;
        let local = TempDir::new().unwrap();
        fs::write(local.path().join("same.txt"), b"identical").unwrap();
        fs::write(local.path().join("grown.txt"), b"local is longer").unwrap();
        fs::write(local.path().join("edited.txt"), b"same len!").unwrap();
        fs::write(local.path().join("only-local.txt"), b"new").unwrap();
        fs::write(local.path().join("skip.tmp"), b"ignored").unwrap();

        index_file(&db, "/Backup/same.txt", b"identical");
        index_file(&db, "/Backup/grown.txt", b"short");
        index_file(&db, "/Backup/edited.txt", b"same len?");
        index_file(&db, "/Backup/only-remote.txt", b"gone");

        let actions = Syncer::new(&db).plan(&opts(local.path()))?;
        let kind_of = |p: &str| {
            actions
                .iter()
                .find(|a| a.remote_path == p)
                .map(|a| a.kind)
        };

        assert_eq!(kind_of("/Backup/same.txt"), None);
        assert_eq!(kind_of("/Backup/grown.txt"), Some(DiffKind::SizeDiff));
        assert_eq!(kind_of("/Backup/edited.txt"), Some(DiffKind::HashDiff));
        assert_eq!(
            kind_of("/Backup/only-local.txt"),
            Some(DiffKind::MissingRemote)
        );
        assert_eq!(
            kind_of("/Backup/only-remote.txt"),
            Some(DiffKind::MissingLocal)
        );
        assert_eq!(kind_of("/Backup/skip.tmp"), None);
        Ok(())
    }

    #[test]
    fn test_push_transfers_local_side_only() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let local = TempDir::new().unwrap();
        fs::write(local.path().join("new.txt"), b"fresh").unwrap();
        index_file(&db, "/Backup/only-remote.txt", b"gone");

        let syncer = Syncer::new(&db);
        let o = opts(local.path());
        let actions = syncer.plan(&o)?;
        let report = syncer.execute(&remote, SyncDirection::Push, &actions, &o, false)?;

        assert_eq!(report.count("transferred"), 1);
        assert_eq!(remote.content_of("/Backup/new.txt").unwrap(), b"fresh");
        // Pull-side work was not touched by a push.
        assert!(!local.path().join("only-remote.txt").exists());
        Ok(())
    }

    #[test]
    fn test_pull_fetches_missing_local() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        remote.add_file("/Backup/doc.txt", b"from remote");
        index_file(&db, "/Backup/doc.txt", b"from remote");
        let local = TempDir::new().unwrap();

        let syncer = Syncer::new(&db);
        let o = opts(local.path());
        let actions = syncer.plan(&o)?;
        let report = syncer.execute(&remote, SyncDirection::Pull, &actions, &o, false)?;

        assert_eq!(report.count("transferred"), 1);
        assert_eq!(
            fs::read(local.path().join("doc.txt")).unwrap(),
            b"from remote"
        );
        Ok(())
    }

    #[test]
    fn test_dry_run_moves_no_bytes() -> Result<()> {
        let db = Database::open_in_memory()?;
        let remote = MemoryRemote::new();
        let local = TempDir::new().unwrap();
        fs::write(local.path().join("new.txt"), b"fresh").unwrap();

        let syncer = Syncer::new(&db);
        let o = opts(local.path());
        let actions = syncer.plan(&o)?;
        let report = syncer.execute(&remote, SyncDirection::Push, &actions, &o, true)?;

        assert_eq!(report.count("would_transfer"), 1);
        assert_eq!(remote.file_count(), 0);
        Ok(())
    }
}
