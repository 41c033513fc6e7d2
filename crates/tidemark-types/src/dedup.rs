use serde::{Deserialize, Serialize};

use crate::file::FileRecord;
use crate::{Error, Result};

/// Removal-safety classification for a duplicate group, ordered by
/// increasing caution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Safe,
    Review,
    Manual,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safe => "safe",
            RiskTier::Review => "review",
            RiskTier::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "safe" => Ok(RiskTier::Safe),
            "review" => Ok(RiskTier::Review),
            "manual" => Ok(RiskTier::Manual),
            other => Err(Error::Decode(format!("unknown risk tier: {}", other))),
        }
    }
}

/// One hash group with a chosen survivor and removal candidates.
///
/// The survivor is selected before candidates are listed, so a group can
/// never propose removing its last copy. `Manual` groups carry no
/// candidates at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub content_hash: String,
    /// Size of one copy in bytes.
    pub size_bytes: i64,
    pub tier: RiskTier,
    /// The member kept; always present in the group's file set.
    pub survivor: FileRecord,
    /// Members proposed for removal. Empty for `Manual`.
    pub candidates: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Bytes reclaimed if every candidate is removed.
    pub fn reclaimable(&self) -> i64 {
        self.size_bytes * self.candidates.len() as i64
    }
}
