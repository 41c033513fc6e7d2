use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::traits::{Listing, RemoteEntry, RemoteListing, RemoteMeta, RemoteMetadata, RemoteOps, RemoteTransfer};
use crate::{Error, Result};

const META_BATCH_LIMIT: usize = 100;

/// Remote backed by a local directory. The governed tree lives under
/// `root`; remote paths are absolute ("/Docs/a.pdf") and map onto the
/// directory one-to-one. Used for local trees, mounted shares, and
/// every integration test.
pub struct FsRemote {
    root: PathBuf,
}

impl FsRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn to_local(&self, remote_path: &str) -> PathBuf {
        self.root.join(remote_path.trim_start_matches('/'))
    }

    fn to_remote(&self, local: &Path) -> Result<String> {
        let rel = local
            .strip_prefix(&self.root)
            .map_err(|_| Error::Remote(format!("path escapes root: {}", local.display())))?;
        let mut remote = String::from("/");
        remote.push_str(&rel.to_string_lossy().replace('\\', "/"));
        Ok(remote)
    }

    fn entry_for(&self, local: &Path) -> Result<RemoteEntry> {
        let meta = fs::metadata(local)?;
        Ok(RemoteEntry {
            path: self.to_remote(local)?,
            remote_id: None,
            size_bytes: if meta.is_dir() { 0 } else { meta.len() as i64 },
            is_dir: meta.is_dir(),
            modified_time: meta.modified().ok().map(format_mtime),
        })
    }

    fn collect(&self, root: &str) -> Result<Vec<RemoteEntry>> {
        let local_root = self.to_local(root);
        if !local_root.exists() {
            return Err(Error::NotFound(root.to_string()));
        }
        let mut entries = Vec::new();
        for item in WalkDir::new(&local_root).min_depth(1).sort_by_file_name() {
            let item = item?;
            entries.push(self.entry_for(item.path())?);
        }
        Ok(entries)
    }
}

fn format_mtime(t: std::time::SystemTime) -> String {
    DateTime::<Utc>::from(t).format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn hash_file(path: &Path) -> Result<String> {
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

impl RemoteListing for FsRemote {
    // A filesystem never truncates enumeration, so both paths return
    // the same complete result; the distinction matters for remotes
    // with a lossy bulk-listing endpoint.
    fn list_all(&self, root: &str) -> Result<Listing> {
        Ok(Listing {
            entries: self.collect(root)?,
            complete: true,
        })
    }

    fn walk(&self, root: &str) -> Result<Vec<RemoteEntry>> {
        self.collect(root)
    }
}

impl RemoteMetadata for FsRemote {
    fn batch_meta(&self, paths: &[String]) -> Result<Vec<RemoteMeta>> {
        let mut metas = Vec::with_capacity(paths.len());
        for path in paths {
            let local = self.to_local(path);
            let meta = fs::metadata(&local).map_err(|_| Error::NotFound(path.clone()))?;
            let content_hash = if meta.is_dir() {
                None
            } else {
                Some(hash_file(&local)?)
            };
            metas.push(RemoteMeta {
                path: path.clone(),
                content_hash,
                size_bytes: if meta.is_dir() { 0 } else { meta.len() as i64 },
                modified_time: meta.modified().ok().map(format_mtime),
            });
        }
        Ok(metas)
    }

    fn max_batch(&self) -> usize {
        META_BATCH_LIMIT
    }
}

impl RemoteOps for FsRemote {
    fn create_dir(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.to_local(path))?;
        Ok(())
    }

    fn move_entry(&self, source: &str, destination: &str) -> Result<()> {
        let from = self.to_local(source);
        let to = self.to_local(destination);
        if !from.exists() {
            return Err(Error::NotFound(source.to_string()));
        }
        if to.exists() {
            return Err(Error::Conflict(destination.to_string()));
        }
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&from, &to)?;
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let local = self.to_local(path);
        if !local.exists() {
            return Err(Error::NotFound(path.to_string()));
        }
        if local.is_dir() {
            fs::remove_dir_all(&local)?;
        } else {
            fs::remove_file(&local)?;
        }
        Ok(())
    }
}

impl RemoteTransfer for FsRemote {
    fn push(&self, local: &Path, remote_path: &str) -> Result<()> {
        let to = self.to_local(remote_path);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(local, &to)?;
        Ok(())
    }

    fn pull(&self, remote_path: &str, local: &Path) -> Result<()> {
        let from = self.to_local(remote_path);
        if !from.exists() {
            return Err(Error::NotFound(remote_path.to_string()));
        }
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, local)?;
        Ok(())
    }
}
