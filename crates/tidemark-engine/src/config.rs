use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tidemark_types::{DirectoryMapping, Taxonomy, TaxonomyNodeConfig};

use crate::{Error, Result};

/// Resolve the data directory:
/// 1. Explicit path (with tilde expansion)
/// 2. TIDEMARK_PATH environment variable (with tilde expansion)
/// 3. ~/.tidemark
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("TIDEMARK_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".tidemark"));
    }

    Err(Error::Config(
        "Could not determine data directory: no home directory found".to_string(),
    ))
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Remote backend. "fs" maps remote paths onto a local directory.
    pub kind: String,
    pub root: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            kind: "fs".to_string(),
            root: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub root: String,
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    pub meta_batch_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: "/".to_string(),
            exclude_dirs: Vec::new(),
            meta_batch_size: 100,
        }
    }
}

/// Extension-class heuristic for the low-confidence rule: any file with
/// one of these extensions is proposed into `category`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionHint {
    pub category: String,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub directory_mappings: Vec<DirectoryMapping>,
    #[serde(default)]
    pub extension_hints: Vec<ExtensionHint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MigrationConfig {
    /// When true, `migrate run` without --dry-run still skips remote
    /// calls. Belt for shared accounts.
    #[serde(default)]
    pub always_dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// Groups with any copy at or above this size are always Manual.
    pub manual_size_threshold_mb: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: Vec::new(),
            manual_size_threshold_mb: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub local_root: String,
    pub remote_prefix: String,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    pub max_files: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            local_root: String::new(),
            remote_prefix: "/".to_string(),
            exclude_patterns: vec![".*".to_string(), "*.tmp".to_string()],
            max_files: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    pub large_file_threshold_mb: u64,
    pub expire_days: i64,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            large_file_threshold_mb: 1024,
            expire_days: 365 * 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    /// Maximum concurrent outstanding remote requests.
    pub max_concurrent_requests: usize,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 4,
            retry_max_attempts: 4,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 5_000,
        }
    }
}

impl ConcurrencyConfig {
    pub fn retry_policy(&self) -> tidemark_remote::RetryPolicy {
        tidemark_remote::RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default = "default_taxonomy")]
    pub taxonomy: Vec<TaxonomyNodeConfig>,
    #[serde(default)]
    pub migration: MigrationConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            remote: RemoteConfig::default(),
            scan: ScanConfig::default(),
            classifier: ClassifierConfig::default(),
            taxonomy: default_taxonomy(),
            migration: MigrationConfig::default(),
            dedup: DedupConfig::default(),
            sync: SyncConfig::default(),
            clean: CleanConfig::default(),
            concurrency: ConcurrencyConfig::default(),
        }
    }
}

fn node(name: &str, keywords: &[&str]) -> TaxonomyNodeConfig {
    TaxonomyNodeConfig {
        name: name.to_string(),
        keywords: keywords.iter().map(|s| s.to_string()).collect(),
        frozen: false,
        children: Vec::new(),
    }
}

/// Starter taxonomy written by `init`; operators are expected to edit
/// it before the first migration.
fn default_taxonomy() -> Vec<TaxonomyNodeConfig> {
    vec![
        TaxonomyNodeConfig {
            name: "Docs".to_string(),
            keywords: vec!["document".to_string(), "report".to_string()],
            frozen: false,
            children: vec![
                node("Finance", &["invoice", "tax", "receipt", "statement"]),
                node("Manuals", &["manual", "guide", "handbook"]),
            ],
        },
        node("Media", &["photo", "screenshot", "recording"]),
        node("Software", &["setup", "installer", "portable"]),
        node("Archive", &["backup", "export"]),
    ]
}

impl GovernanceConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: GovernanceConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build the resolved taxonomy tree from the configured categories.
    pub fn taxonomy(&self) -> Result<Taxonomy> {
        Taxonomy::from_config(&self.taxonomy).map_err(|e| Error::Config(e.to_string()))
    }
}
