// Governance engine for the tidemark workspace.
// Every component takes an explicit &Database handle and collaborator
// trait objects; there is no ambient connection or global state.

pub mod classifier;
pub mod cleaner;
pub mod config;
pub mod dedup;
mod error;
pub mod migrator;
pub mod pool;
pub mod report;
pub mod scanner;
pub mod sync;

pub use classifier::{Classifier, Rule, RuleContext, RuleMatch};
pub use cleaner::{CleanOptions, CleanReport, Cleaner};
pub use config::{GovernanceConfig, resolve_data_dir};
pub use dedup::{DedupPolicy, Deduplicator};
pub use error::{Error, Result};
pub use migrator::{DecisionSource, FixedDecision, MigrateOptions, Migrator, MoveProposal};
pub use report::{ItemFailure, JobReport};
pub use scanner::{ScanOptions, Scanner};
pub use sync::{DiffKind, SyncAction, SyncDirection, SyncOptions, Syncer};
