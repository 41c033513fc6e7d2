use serde::{Deserialize, Serialize};

/// One row per scan invocation, append-only.
///
/// `complete` records whether the bulk listing path succeeded or the
/// per-directory fallback walk was used; downstream consumers use it to
/// answer "when was the last trustworthy full scan".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanBatch {
    /// Scan batch identifier (uuid, shortened for display).
    pub id: String,
    /// Root the scan covered.
    pub root: String,
    /// RFC 3339 start timestamp.
    pub started_at: String,
    /// RFC 3339 end timestamp, None while in flight.
    pub finished_at: Option<String>,
    /// Entries discovered in the listing.
    pub discovered: u64,
    /// Records upserted into the index.
    pub updated: u64,
    /// Files whose metadata enrichment failed.
    pub errored: u64,
    /// True when the full-listing path succeeded without truncation.
    pub complete: bool,
}
