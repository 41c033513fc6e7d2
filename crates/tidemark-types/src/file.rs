use serde::{Deserialize, Serialize};

use crate::util::split_path;

/// One row of the remote-tree mirror.
///
/// `path` is the full remote path and the primary join key for
/// classification and migration. `content_hash` is nullable: listing
/// responses carry no hash, it is filled in by the metadata-enrichment
/// pass of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full remote path, unique.
    pub path: String,
    /// Provider-side identifier, if the remote exposes one.
    pub remote_id: Option<String>,
    /// Content-addressed identity (hex digest). Absent until enriched.
    pub content_hash: Option<String>,
    /// Size in bytes (0 for directories).
    pub size_bytes: i64,
    /// Remote modification time (RFC 3339), if known.
    pub modified_time: Option<String>,
    /// Whether this record is a directory.
    pub is_dir: bool,
    /// Lowercased extension including the dot, empty for directories.
    pub extension: String,
    /// Parent directory path ("/" for top-level entries).
    pub parent_dir: String,
    /// When this record was last written by a scan (RFC 3339).
    pub scanned_at: Option<String>,
}

impl FileRecord {
    /// Build a record from path + basic listing metadata, deriving
    /// `extension` and `parent_dir` canonically.
    pub fn new(path: impl Into<String>, size_bytes: i64, is_dir: bool) -> Self {
        let path = path.into();
        let (parent_dir, filename) = split_path(&path);
        let extension = if is_dir {
            String::new()
        } else {
            filename
                .rfind('.')
                .filter(|i| *i > 0)
                .map(|i| filename[i..].to_ascii_lowercase())
                .unwrap_or_default()
        };

        Self {
            path,
            remote_id: None,
            content_hash: None,
            size_bytes,
            modified_time: None,
            is_dir,
            extension,
            parent_dir,
            scanned_at: None,
        }
    }

    /// File name component of `path`.
    pub fn file_name(&self) -> &str {
        split_path(&self.path).1
    }
}
