use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The four migration phases, strictly sequential. The last completed
/// phase is persisted on the batch so an interrupted run resumes from
/// the log rather than re-deriving state from remote side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    Structure,
    AutoMigrate,
    ReviewMigrate,
    Cleanup,
}

impl MigrationPhase {
    pub fn number(&self) -> i64 {
        match self {
            MigrationPhase::Structure => 1,
            MigrationPhase::AutoMigrate => 2,
            MigrationPhase::ReviewMigrate => 3,
            MigrationPhase::Cleanup => 4,
        }
    }

    pub fn from_number(n: i64) -> Result<Self> {
        match n {
            1 => Ok(MigrationPhase::Structure),
            2 => Ok(MigrationPhase::AutoMigrate),
            3 => Ok(MigrationPhase::ReviewMigrate),
            4 => Ok(MigrationPhase::Cleanup),
            other => Err(Error::Decode(format!("invalid migration phase: {}", other))),
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1).ok()
    }

    pub fn label(&self) -> &'static str {
        match self {
            MigrationPhase::Structure => "structure",
            MigrationPhase::AutoMigrate => "auto-migrate",
            MigrationPhase::ReviewMigrate => "review-migrate",
            MigrationPhase::Cleanup => "cleanup",
        }
    }
}

/// Lifecycle of one logged move. Status only ever advances forward:
/// planned -> applied -> rolled_back, or planned -> failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    Planned,
    Applied,
    Failed,
    RolledBack,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStatus::Planned => "planned",
            MigrationStatus::Applied => "applied",
            MigrationStatus::Failed => "failed",
            MigrationStatus::RolledBack => "rolled_back",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "planned" => Ok(MigrationStatus::Planned),
            "applied" => Ok(MigrationStatus::Applied),
            "failed" => Ok(MigrationStatus::Failed),
            "rolled_back" => Ok(MigrationStatus::RolledBack),
            other => Err(Error::Decode(format!("unknown migration status: {}", other))),
        }
    }

    /// Forward-only transition check. The audit trail never moves a row
    /// backwards.
    pub fn can_advance_to(&self, next: MigrationStatus) -> bool {
        matches!(
            (self, next),
            (MigrationStatus::Planned, MigrationStatus::Applied)
                | (MigrationStatus::Planned, MigrationStatus::Failed)
                | (MigrationStatus::Applied, MigrationStatus::RolledBack)
        )
    }
}

/// One planned or executed move within a migration batch.
///
/// Entries for a batch form a complete ordered record sufficient to
/// reverse every applied move without consulting any other state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationLogEntry {
    /// Store-assigned row id; ordering within a batch.
    pub id: i64,
    /// Groups a single migration run across all four phases.
    pub batch_id: String,
    pub phase: MigrationPhase,
    pub source_path: String,
    pub destination_path: String,
    pub status: MigrationStatus,
    /// Failure reason when status is `Failed`.
    pub error: Option<String>,
    /// RFC 3339 timestamp of the apply (or failure).
    pub applied_at: Option<String>,
}

/// Per-batch checkpoint row. `last_completed_phase` is None until
/// phase 1 finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationBatch {
    pub batch_id: String,
    pub created_at: String,
    pub last_completed_phase: Option<MigrationPhase>,
}

/// Phase 3 proposal verdict from the interactive decision collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
    Defer,
}
