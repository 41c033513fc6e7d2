use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

/// One per-item failure, recovered locally and surfaced in the summary.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    pub path: String,
    pub error: String,
}

/// End-of-job summary. Per-item failures aggregate here; only
/// whole-batch-invalidating conditions surface as `Err` from a job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub counts: BTreeMap<String, u64>,
    pub failures: Vec<ItemFailure>,
}

impl JobReport {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            started_at: now_utc(),
            finished_at: None,
            counts: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    pub fn bump(&mut self, key: &str, n: u64) {
        *self.counts.entry(key.to_string()).or_insert(0) += n;
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn add_failure(&mut self, path: impl Into<String>, error: impl Into<String>) {
        let path = path.into();
        let error = error.into();
        self.bump("failed", 1);
        self.failures.push(ItemFailure { path, error });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(now_utc());
    }

    /// One-line count summary, e.g. "scan: discovered=120 updated=7 errored=0".
    pub fn summary_line(&self) -> String {
        let counts = self
            .counts
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        if counts.is_empty() {
            format!("{}: nothing to do", self.job)
        } else {
            format!("{}: {}", self.job, counts)
        }
    }
}

pub fn now_utc() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut report = JobReport::new("scan");
        report.bump("discovered", 10);
        report.bump("discovered", 5);
        assert_eq!(report.count("discovered"), 15);
    }

    #[test]
    fn test_failures_counted() {
        let mut report = JobReport::new("migrate");
        report.add_failure("/a.txt", "destination occupied");
        report.add_failure("/b.txt", "destination occupied");
        assert_eq!(report.count("failed"), 2);
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn test_summary_line() {
        let mut report = JobReport::new("scan");
        report.bump("discovered", 3);
        report.bump("updated", 1);
        assert_eq!(report.summary_line(), "scan: discovered=3 updated=1");
    }
}
