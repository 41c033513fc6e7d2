//! Common test utilities shared across integration tests.
//!
//! Note: Clippy cannot track usage across integration test files,
//! hence the `allow(dead_code)` annotation. This is a standard pattern
//! for Rust integration test fixtures.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestFixture {
    _temp_dir: TempDir,
    data_dir: PathBuf,
    remote_root: PathBuf,
    local_root: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".tidemark");
        let remote_root = temp_dir.path().join("remote");
        let local_root = temp_dir.path().join("local");

        fs::create_dir_all(&data_dir).expect("Failed to create data dir");
        fs::create_dir_all(&remote_root).expect("Failed to create remote root");
        fs::create_dir_all(&local_root).expect("Failed to create local root");

        let fixture = Self {
            _temp_dir: temp_dir,
            data_dir,
            remote_root,
            local_root,
        };
        fixture.write_config();
        fixture
    }

    fn write_config(&self) {
        let config = format!(
            r#"
[remote]
kind = "fs"
root = "{remote}"

[scan]
root = "/"
meta_batch_size = 50

[[classifier.directory_mappings]]
source = "/Inbox/Scans"
target = "/Docs/Finance"

[[classifier.extension_hints]]
category = "/Media"
extensions = [".jpg", ".png"]

[[taxonomy]]
name = "Docs"
keywords = ["document", "report"]

[[taxonomy.children]]
name = "Finance"
keywords = ["invoice", "tax", "receipt"]

[[taxonomy]]
name = "Media"
keywords = ["photo", "screenshot"]

[dedup]
manual_size_threshold_mb = 512

[sync]
local_root = "{local}"
remote_prefix = "/"
max_files = 500

[clean]
large_file_threshold_mb = 1024
expire_days = 730
"#,
            remote = self.remote_root.display(),
            local = self.local_root.display(),
        );
        fs::write(self.data_dir.join("config.toml"), config).expect("Failed to write config");
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn remote_root(&self) -> &PathBuf {
        &self.remote_root
    }

    pub fn local_root(&self) -> &PathBuf {
        &self.local_root
    }

    /// Write a file into the fake remote at a remote-style path ("/a/b").
    pub fn add_remote_file(&self, remote_path: &str, content: &[u8]) {
        let rel = remote_path.trim_start_matches('/');
        let dest = self.remote_root.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).expect("Failed to create remote dirs");
        }
        fs::write(dest, content).expect("Failed to write remote file");
    }

    pub fn remote_has(&self, remote_path: &str) -> bool {
        self.remote_root
            .join(remote_path.trim_start_matches('/'))
            .exists()
    }

    pub fn add_local_file(&self, rel: &str, content: &[u8]) {
        let dest = self.local_root.join(rel);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).expect("Failed to create local dirs");
        }
        fs::write(dest, content).expect("Failed to write local file");
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tidemark").expect("Failed to find tidemark binary");
        cmd.arg("--data-dir").arg(&self.data_dir);
        cmd
    }

    /// Run a subcommand that is expected to succeed and return stdout.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to run tidemark");
        assert!(
            output.status.success(),
            "tidemark {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("tidemark.db")
    }
}

pub fn read_to_string(path: &Path) -> String {
    fs::read_to_string(path).expect("Failed to read file")
}
