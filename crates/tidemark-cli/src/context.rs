use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tidemark_engine::{GovernanceConfig, resolve_data_dir};
use tidemark_index::Database;
use tidemark_remote::FsRemote;

use crate::args::OutputFormat;

pub const DB_FILE: &str = "tidemark.db";
pub const CONFIG_FILE: &str = "config.toml";

/// Resolved per-invocation environment: data directory, loaded config,
/// and output preferences. Handlers open the database lazily so that
/// `init` can run before the store exists.
pub struct ExecutionContext {
    pub data_dir: PathBuf,
    pub config: GovernanceConfig,
    pub format: OutputFormat,
    pub verbose: bool,
}

impl ExecutionContext {
    pub fn new(
        data_dir: Option<&str>,
        format: OutputFormat,
        verbose: bool,
    ) -> Result<Self> {
        let data_dir = resolve_data_dir(data_dir)?;
        let config = GovernanceConfig::load_from(&data_dir.join(CONFIG_FILE))
            .context("failed to load config.toml")?;
        Ok(Self {
            data_dir,
            config,
            format,
            verbose,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Open the existing index store; errors if `init` has not run.
    pub fn db(&self) -> Result<Database> {
        Ok(Database::open_existing(&self.db_path())?)
    }

    /// Build the configured remote backend.
    pub fn remote(&self) -> Result<FsRemote> {
        if self.config.remote.kind != "fs" {
            bail!("unsupported remote kind: {}", self.config.remote.kind);
        }
        if self.config.remote.root.is_empty() {
            bail!(
                "remote.root is not set; edit {}",
                self.config_path().display()
            );
        }
        Ok(FsRemote::new(&self.config.remote.root))
    }
}
