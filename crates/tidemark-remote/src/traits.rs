use std::path::Path;

use crate::Result;

/// One entry as the remote reports it during listing. Listing output is
/// metadata-light: content hashes arrive later through `RemoteMetadata`.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub path: String,
    pub remote_id: Option<String>,
    pub size_bytes: i64,
    pub is_dir: bool,
    pub modified_time: Option<String>,
}

/// A full-tree listing plus an honesty flag: `complete` is false when
/// the remote truncated or aborted the enumeration, and the caller must
/// fall back to a per-directory walk.
#[derive(Debug, Clone)]
pub struct Listing {
    pub entries: Vec<RemoteEntry>,
    pub complete: bool,
}

/// Per-file enrichment metadata.
#[derive(Debug, Clone)]
pub struct RemoteMeta {
    pub path: String,
    pub content_hash: Option<String>,
    pub size_bytes: i64,
    pub modified_time: Option<String>,
}

/// Tree enumeration.
///
/// Responsibilities:
/// - Fast bulk listing when the remote supports it
/// - Per-directory recursive walk as the reliable fallback
pub trait RemoteListing: Send + Sync {
    /// Enumerate the whole tree under `root` in one pass. May return a
    /// partial result; `Listing::complete` says so.
    fn list_all(&self, root: &str) -> Result<Listing>;

    /// Recursive per-directory walk. Slower, but what it returns is the
    /// whole truth for the subtree.
    fn walk(&self, root: &str) -> Result<Vec<RemoteEntry>>;
}

/// Metadata enrichment, batched to the remote's limits.
pub trait RemoteMetadata: Send + Sync {
    /// Fetch content hashes and timestamps for up to `max_batch` paths.
    fn batch_meta(&self, paths: &[String]) -> Result<Vec<RemoteMeta>>;

    /// Largest batch `batch_meta` accepts in one call.
    fn max_batch(&self) -> usize;
}

/// Mutations of the remote tree.
pub trait RemoteOps: Send + Sync {
    fn create_dir(&self, path: &str) -> Result<()>;

    /// Move or rename. Fails with `Error::Conflict` when the
    /// destination exists; never overwrites.
    fn move_entry(&self, source: &str, destination: &str) -> Result<()>;

    fn delete(&self, path: &str) -> Result<()>;
}

/// Byte transfer between the remote and the local filesystem.
pub trait RemoteTransfer: Send + Sync {
    fn push(&self, local: &Path, remote_path: &str) -> Result<()>;

    fn pull(&self, remote_path: &str, local: &Path) -> Result<()>;
}

/// Everything a governance run needs from a remote.
pub trait Remote: RemoteListing + RemoteMetadata + RemoteOps + RemoteTransfer {}

impl<T: RemoteListing + RemoteMetadata + RemoteOps + RemoteTransfer> Remote for T {}
