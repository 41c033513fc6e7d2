use tidemark_types::{
    ConfidenceTier, DirectoryMapping, FileRecord, Taxonomy, UNCLASSIFIED_CATEGORY, is_under,
};

use crate::config::ExtensionHint;

/// Everything a rule may consult. Rules never see the clock or the
/// store, which keeps the cascade deterministic by construction.
pub struct RuleContext<'a> {
    pub taxonomy: &'a Taxonomy,
    pub mappings: &'a [DirectoryMapping],
    pub extension_hints: &'a [ExtensionHint],
}

pub struct RuleMatch {
    pub category_path: String,
    pub tier: ConfidenceTier,
    pub reason: String,
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn attempt(&self, file: &FileRecord, ctx: &RuleContext) -> Option<RuleMatch>;
}

/// Rule 1: configured directory mappings. Exact matches win over prefix
/// matches; within each kind, declaration order decides.
pub struct DirectoryMappingRule;

impl Rule for DirectoryMappingRule {
    fn name(&self) -> &'static str {
        "directory_mapping"
    }

    fn attempt(&self, file: &FileRecord, ctx: &RuleContext) -> Option<RuleMatch> {
        for mapping in ctx.mappings {
            if file.parent_dir == mapping.source {
                return Some(RuleMatch {
                    category_path: mapping.target.clone(),
                    tier: ConfidenceTier::High,
                    reason: format!("directory {} maps to {}", mapping.source, mapping.target),
                });
            }
        }
        for mapping in ctx.mappings {
            if is_under(&file.parent_dir, &mapping.source) {
                // Prefix match keeps the sub-path below the mapped dir.
                let sub = &file.parent_dir[mapping.source.len()..];
                return Some(RuleMatch {
                    category_path: format!("{}{}", mapping.target, sub),
                    tier: ConfidenceTier::High,
                    reason: format!("under mapped directory {}", mapping.source),
                });
            }
        }
        None
    }
}

/// Rule 2: per-category keyword sets against the lowercased full path,
/// so a keyword can hit in the filename or in any ancestor directory
/// name. Most matched keywords wins; equal counts fall back to taxonomy
/// declaration order.
pub struct KeywordRule;

impl Rule for KeywordRule {
    fn name(&self) -> &'static str {
        "keyword_match"
    }

    fn attempt(&self, file: &FileRecord, ctx: &RuleContext) -> Option<RuleMatch> {
        let text = file.path.to_lowercase();

        let mut best: Option<(usize, usize, &str, Vec<&str>)> = None;
        for node in ctx.taxonomy.nodes() {
            if node.frozen || node.keywords.is_empty() {
                continue;
            }
            let hits: Vec<&str> = node
                .keywords
                .iter()
                .filter(|kw| text.contains(kw.to_lowercase().as_str()))
                .map(|kw| kw.as_str())
                .collect();
            if hits.is_empty() {
                continue;
            }
            let better = match &best {
                None => true,
                Some((count, order, _, _)) => {
                    hits.len() > *count || (hits.len() == *count && node.order < *order)
                }
            };
            if better {
                best = Some((hits.len(), node.order, &node.path, hits));
            }
        }

        best.map(|(_, _, path, hits)| RuleMatch {
            category_path: path.to_string(),
            tier: ConfidenceTier::Medium,
            reason: format!("matched keywords: {}", hits.join(", ")),
        })
    }
}

/// Rule 3: extension-class heuristics from config.
pub struct ExtensionRule;

impl Rule for ExtensionRule {
    fn name(&self) -> &'static str {
        "extension_hint"
    }

    fn attempt(&self, file: &FileRecord, ctx: &RuleContext) -> Option<RuleMatch> {
        if file.extension.is_empty() {
            return None;
        }
        for hint in ctx.extension_hints {
            if hint
                .extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(&file.extension))
            {
                return Some(RuleMatch {
                    category_path: hint.category.clone(),
                    tier: ConfidenceTier::Low,
                    reason: format!("extension {} suggests {}", file.extension, hint.category),
                });
            }
        }
        None
    }
}

/// Rule 4: total fallback. Always matches, so the cascade never fails
/// to produce a result.
pub struct UnclassifiedRule;

impl Rule for UnclassifiedRule {
    fn name(&self) -> &'static str {
        "unclassified"
    }

    fn attempt(&self, _file: &FileRecord, _ctx: &RuleContext) -> Option<RuleMatch> {
        Some(RuleMatch {
            category_path: UNCLASSIFIED_CATEGORY.to_string(),
            tier: ConfidenceTier::Low,
            reason: "no rule matched".to_string(),
        })
    }
}
