use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(about = "Index, classify, and govern a large remote file tree", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory holding the index store and config.toml
    /// (default: $TIDEMARK_PATH, then ~/.tidemark)
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    #[arg(long, default_value = "plain", global = true)]
    pub format: OutputFormat,

    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory, index store, and a starter config
    Init,

    /// List the remote tree and refresh the index
    Scan {
        /// Override the configured scan root for this run
        #[arg(long)]
        root: Option<String>,
    },

    /// Propose a category for every indexed file
    Classify {
        /// Re-classify files that already have an active classification
        #[arg(long)]
        force: bool,

        /// Print every proposal, not just the summary
        #[arg(long)]
        detail: bool,
    },

    Taxonomy {
        #[command(subcommand)]
        command: TaxonomyCommand,
    },

    Migrate {
        #[command(subcommand)]
        command: MigrateCommand,
    },

    Dedup {
        #[command(subcommand)]
        command: DedupCommand,
    },

    /// One-directional reconciliation against a local directory
    Sync {
        #[command(subcommand)]
        command: SyncCommand,
    },

    Clean {
        #[command(subcommand)]
        command: CleanCommand,
    },

    /// Index statistics, last scan, and lease state
    Status {
        /// Drop a stale write lease left by a crashed job
        #[arg(long)]
        clear_lease: bool,
    },
}

#[derive(Subcommand)]
pub enum TaxonomyCommand {
    /// Print the configured category tree
    Show,
}

#[derive(Subcommand)]
pub enum MigrateCommand {
    /// Show the moves the current classifications imply
    Plan,

    /// Open a new migration batch and print its id
    Start,

    /// Run one phase of a batch (phases must run in order, 1-4)
    Run {
        batch_id: String,

        #[arg(long)]
        phase: i64,

        #[arg(long)]
        dry_run: bool,

        /// Accept every review proposal without prompting
        #[arg(long)]
        yes: bool,

        /// Defer every review proposal without prompting
        #[arg(long, conflicts_with = "yes")]
        defer_all: bool,
    },

    /// Undo the applied moves of a batch, newest first
    Rollback {
        batch_id: String,

        #[arg(long)]
        dry_run: bool,
    },

    /// List migration batches and their phase checkpoints
    Batches,
}

#[derive(Subcommand)]
pub enum DedupCommand {
    /// Group byte-identical files and tier them by removal risk
    Report {
        /// Print every group, not just the per-tier summary
        #[arg(long)]
        detail: bool,
    },

    /// Remove duplicate candidates at or below a risk tier
    Apply {
        /// "safe" or "review"; manual groups are never applied in bulk
        #[arg(long)]
        tier: String,

        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum SyncCommand {
    /// Transfer local-side differences up to the remote
    Push {
        #[arg(long)]
        dry_run: bool,
    },

    /// Transfer remote-side differences down to the local directory
    Pull {
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum CleanCommand {
    /// Report reclaimable space: duplicates, large, expired, empty dirs
    Report,

    /// Delete safe duplicates and empty directories
    Apply {
        #[arg(long)]
        dry_run: bool,
    },
}
