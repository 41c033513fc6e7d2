use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::sync::Mutex;

use sha2::{Digest, Sha256};
use tidemark_remote::{
    Error, Listing, RemoteEntry, RemoteListing, RemoteMeta, RemoteMetadata, RemoteOps,
    RemoteTransfer, Result,
};
use tidemark_types::{is_under, split_path};

const META_BATCH_LIMIT: usize = 10;

#[derive(Clone)]
struct MemFile {
    content: Vec<u8>,
    modified_time: Option<String>,
}

#[derive(Default)]
struct State {
    files: BTreeMap<String, MemFile>,
    dirs: BTreeSet<String>,
    truncate_listing: bool,
    fail_meta_paths: HashSet<String>,
    meta_transient_failures: u32,
    moves: Vec<(String, String)>,
    deletes: Vec<String>,
}

/// Scriptable in-memory remote tree.
///
/// Fault injection covers the failure modes governance code must
/// survive: truncated bulk listings, metadata batches that error, and
/// occupied move destinations.
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn add_file(&self, path: &str, content: &[u8]) -> &Self {
        let mut state = self.state.lock().unwrap();
        let mut dir = split_path(path).0;
        while dir != "/" {
            state.dirs.insert(dir.clone());
            dir = split_path(&dir).0;
        }
        state.files.insert(
            path.to_string(),
            MemFile {
                content: content.to_vec(),
                modified_time: None,
            },
        );
        self
    }

    pub fn add_file_with_mtime(&self, path: &str, content: &[u8], mtime: &str) -> &Self {
        self.add_file(path, content);
        self.state
            .lock()
            .unwrap()
            .files
            .get_mut(path)
            .unwrap()
            .modified_time = Some(mtime.to_string());
        self
    }

    pub fn add_dir(&self, path: &str) -> &Self {
        self.state.lock().unwrap().dirs.insert(path.to_string());
        self
    }

    /// Make `list_all` return only half the tree with `complete = false`.
    pub fn truncate_listing(&self) -> &Self {
        self.state.lock().unwrap().truncate_listing = true;
        self
    }

    /// Any metadata batch containing `path` fails permanently.
    pub fn fail_meta_for(&self, path: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .fail_meta_paths
            .insert(path.to_string());
        self
    }

    /// The next `n` metadata batch calls fail with a transient error.
    pub fn fail_next_meta_calls(&self, n: u32) -> &Self {
        self.state.lock().unwrap().meta_transient_failures = n;
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }

    pub fn content_of(&self, path: &str) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .map(|f| f.content.clone())
    }

    pub fn moves(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().moves.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.state.lock().unwrap().deletes.clone()
    }

    fn entries_under(state: &State, root: &str) -> Vec<RemoteEntry> {
        let mut entries = Vec::new();
        for dir in &state.dirs {
            if dir != root && (root == "/" || is_under(dir, root)) {
                entries.push(RemoteEntry {
                    path: dir.clone(),
                    remote_id: None,
                    size_bytes: 0,
                    is_dir: true,
                    modified_time: None,
                });
            }
        }
        for (path, file) in &state.files {
            if root == "/" || is_under(path, root) {
                entries.push(RemoteEntry {
                    path: path.clone(),
                    remote_id: Some(format!("mem-{}", entries.len())),
                    size_bytes: file.content.len() as i64,
                    is_dir: false,
                    modified_time: file.modified_time.clone(),
                });
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }
}

fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

impl RemoteListing for MemoryRemote {
    fn list_all(&self, root: &str) -> Result<Listing> {
        let state = self.state.lock().unwrap();
        let mut entries = Self::entries_under(&state, root);
        if state.truncate_listing {
            entries.truncate(entries.len() / 2);
            return Ok(Listing {
                entries,
                complete: false,
            });
        }
        Ok(Listing {
            entries,
            complete: true,
        })
    }

    fn walk(&self, root: &str) -> Result<Vec<RemoteEntry>> {
        let state = self.state.lock().unwrap();
        Ok(Self::entries_under(&state, root))
    }
}

impl RemoteMetadata for MemoryRemote {
    fn batch_meta(&self, paths: &[String]) -> Result<Vec<RemoteMeta>> {
        let mut state = self.state.lock().unwrap();
        if state.meta_transient_failures > 0 {
            state.meta_transient_failures -= 1;
            return Err(Error::Transient("scripted metadata outage".to_string()));
        }
        if paths.iter().any(|p| state.fail_meta_paths.contains(p)) {
            return Err(Error::Remote("scripted metadata failure".to_string()));
        }

        let mut metas = Vec::with_capacity(paths.len());
        for path in paths {
            let file = state
                .files
                .get(path)
                .ok_or_else(|| Error::NotFound(path.clone()))?;
            metas.push(RemoteMeta {
                path: path.clone(),
                content_hash: Some(hash_bytes(&file.content)),
                size_bytes: file.content.len() as i64,
                modified_time: file.modified_time.clone(),
            });
        }
        Ok(metas)
    }

    fn max_batch(&self) -> usize {
        META_BATCH_LIMIT
    }
}

impl RemoteOps for MemoryRemote {
    fn create_dir(&self, path: &str) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn move_entry(&self, source: &str, destination: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.files.contains_key(destination) || state.dirs.contains(destination) {
            return Err(Error::Conflict(destination.to_string()));
        }

        if let Some(file) = state.files.remove(source) {
            state.files.insert(destination.to_string(), file);
        } else if state.dirs.remove(source) {
            state.dirs.insert(destination.to_string());
            let children: Vec<String> = state
                .files
                .keys()
                .filter(|p| is_under(p, source))
                .cloned()
                .collect();
            for child in children {
                let new_path = format!("{}{}", destination, &child[source.len()..]);
                let file = state.files.remove(&child).unwrap();
                state.files.insert(new_path, file);
            }
        } else {
            return Err(Error::NotFound(source.to_string()));
        }

        state.moves.push((source.to_string(), destination.to_string()));
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let was_file = state.files.remove(path).is_some();
        let was_dir = state.dirs.remove(path);
        if !was_file && !was_dir {
            return Err(Error::NotFound(path.to_string()));
        }
        if was_dir {
            // Recursive, like a real tree delete.
            state.files.retain(|p, _| !is_under(p, path));
            state.dirs.retain(|d| !is_under(d, path));
        }
        state.deletes.push(path.to_string());
        Ok(())
    }
}

impl RemoteTransfer for MemoryRemote {
    fn push(&self, local: &Path, remote_path: &str) -> Result<()> {
        let content = std::fs::read(local)?;
        self.add_file(remote_path, &content);
        Ok(())
    }

    fn pull(&self, remote_path: &str, local: &Path) -> Result<()> {
        let content = self
            .content_of(remote_path)
            .ok_or_else(|| Error::NotFound(remote_path.to_string()))?;
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(local, content)?;
        Ok(())
    }
}
