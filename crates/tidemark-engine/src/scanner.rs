use std::collections::HashMap;

use tidemark_index::Database;
use tidemark_remote::{
    RemoteEntry, RemoteListing, RemoteMeta, RemoteMetadata, RetryPolicy, with_retry,
};
use tidemark_types::{FileRecord, ScanBatch, is_under};
use uuid::Uuid;

use crate::config::GovernanceConfig;
use crate::report::{JobReport, now_utc};
use crate::{Error, Result, pool};

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub root: String,
    pub exclude_dirs: Vec<String>,
    pub meta_batch_size: usize,
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl ScanOptions {
    pub fn from_config(config: &GovernanceConfig) -> Self {
        Self {
            root: config.scan.root.clone(),
            exclude_dirs: config.scan.exclude_dirs.clone(),
            meta_batch_size: config.scan.meta_batch_size,
            workers: config.concurrency.max_concurrent_requests,
            retry: config.concurrency.retry_policy(),
        }
    }
}

/// Populates the index from the remote tree.
///
/// Listing is all-or-nothing at the batch level: if both the bulk
/// listing and the fallback walk fail, nothing is upserted and no scan
/// batch is recorded, so the index never claims a scan it did not do.
pub struct Scanner<'a> {
    db: &'a Database,
}

impl<'a> Scanner<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn run(
        &self,
        listing: &dyn RemoteListing,
        meta: &dyn RemoteMetadata,
        opts: &ScanOptions,
    ) -> Result<(ScanBatch, JobReport)> {
        let mut report = JobReport::new("scan");
        let (entries, complete) = self.obtain_entries(listing, opts)?;
        if !complete {
            report.bump("fallback_walk", 1);
        }

        let entries: Vec<RemoteEntry> = entries
            .into_iter()
            .filter(|e| !opts.exclude_dirs.iter().any(|d| is_under(&e.path, d)))
            .collect();

        let mut batch = ScanBatch {
            id: Uuid::new_v4().to_string(),
            root: opts.root.clone(),
            started_at: now_utc(),
            finished_at: None,
            discovered: entries.len() as u64,
            updated: 0,
            errored: 0,
            complete,
        };
        self.db.record_scan_start(&batch)?;

        let file_paths: Vec<String> = entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.path.clone())
            .collect();
        let (metas, errored_paths) = self.fetch_metadata(meta, &file_paths, opts, &mut report);

        let scanned_at = now_utc();
        let mut records = Vec::with_capacity(entries.len());
        for entry in &entries {
            if errored_paths.contains_key(&entry.path) {
                continue;
            }
            let mut record = FileRecord::new(&entry.path, entry.size_bytes, entry.is_dir);
            record.remote_id = entry.remote_id.clone();
            record.modified_time = entry.modified_time.clone();
            record.scanned_at = Some(scanned_at.clone());
            if let Some(m) = metas.get(&entry.path) {
                record.content_hash = m.content_hash.clone();
                record.size_bytes = m.size_bytes;
                if m.modified_time.is_some() {
                    record.modified_time = m.modified_time.clone();
                }
            }
            records.push(record);
        }

        batch.updated = self.db.upsert_files(&records)? as u64;
        batch.errored = errored_paths.len() as u64;
        batch.finished_at = Some(now_utc());
        self.db.finish_scan(&batch)?;

        report.bump("discovered", batch.discovered);
        report.bump("updated", batch.updated);
        report.bump("errored", batch.errored);
        report.finish();
        Ok((batch, report))
    }

    fn obtain_entries(
        &self,
        listing: &dyn RemoteListing,
        opts: &ScanOptions,
    ) -> Result<(Vec<RemoteEntry>, bool)> {
        match listing.list_all(&opts.root) {
            Ok(result) if result.complete => Ok((result.entries, true)),
            // Truncated or failed bulk listing: the per-directory walk
            // is slower but exhaustive. Its failure aborts the scan.
            Ok(_) | Err(_) => {
                let entries = listing.walk(&opts.root).map_err(Error::Remote)?;
                Ok((entries, false))
            }
        }
    }

    /// Fetch content hashes in bounded batches over the worker pool.
    /// A batch that still fails after retries marks its files errored;
    /// those files are skipped this scan, the rest commit normally.
    fn fetch_metadata(
        &self,
        meta: &dyn RemoteMetadata,
        paths: &[String],
        opts: &ScanOptions,
        report: &mut JobReport,
    ) -> (HashMap<String, RemoteMeta>, HashMap<String, String>) {
        let chunk_size = opts.meta_batch_size.min(meta.max_batch()).max(1);
        let chunks: Vec<Vec<String>> = paths.chunks(chunk_size).map(|c| c.to_vec()).collect();

        let results = pool::run_batches(opts.workers, chunks, |chunk| {
            let outcome = with_retry(&opts.retry, || meta.batch_meta(&chunk));
            (chunk, outcome)
        });

        let mut metas = HashMap::new();
        let mut errored = HashMap::new();
        for (chunk, outcome) in results {
            match outcome {
                Ok(batch) => {
                    for m in batch {
                        metas.insert(m.path.clone(), m);
                    }
                }
                Err(err) => {
                    let msg = err.to_string();
                    for path in chunk {
                        report.add_failure(&path, &msg);
                        errored.insert(path, msg.clone());
                    }
                }
            }
        }
        (metas, errored)
    }
}
