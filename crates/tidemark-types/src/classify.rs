use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Reserved category assigned when no rule matches.
pub const UNCLASSIFIED_CATEGORY: &str = "/Unsorted";

/// Classifier certainty label. Drives automatic (high) versus
/// interactive (medium/low) migration handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "high" => Ok(ConfidenceTier::High),
            "medium" => Ok(ConfidenceTier::Medium),
            "low" => Ok(ConfidenceTier::Low),
            other => Err(Error::Decode(format!("unknown confidence tier: {}", other))),
        }
    }
}

/// The single active classification for one file.
///
/// Re-classification supersedes the previous row; history is not kept
/// unless the caller asks the store to retain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// File path, joins to `FileRecord.path`.
    pub path: String,
    /// Proposed taxonomy node path.
    pub category_path: String,
    pub tier: ConfidenceTier,
    /// Name of the rule that produced this result.
    pub rule_matched: String,
    /// Human-readable explanation of the match.
    pub reason: String,
    /// RFC 3339 timestamp, stamped at save time.
    pub classified_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_round_trip() {
        for tier in [
            ConfidenceTier::High,
            ConfidenceTier::Medium,
            ConfidenceTier::Low,
        ] {
            assert_eq!(ConfidenceTier::parse(tier.as_str()).unwrap(), tier);
        }
        assert!(ConfidenceTier::parse("certain").is_err());
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ConfidenceTier::High > ConfidenceTier::Medium);
        assert!(ConfidenceTier::Medium > ConfidenceTier::Low);
    }
}
