mod rules;

pub use rules::{
    DirectoryMappingRule, ExtensionRule, KeywordRule, Rule, RuleContext, RuleMatch,
    UnclassifiedRule,
};

use tidemark_index::Database;
use tidemark_types::{ClassificationResult, FileRecord};

use crate::report::{JobReport, now_utc};
use crate::Result;

/// The ordered rule cascade. First match wins; the final rule is total,
/// so classification always produces exactly one result per file.
pub struct Classifier {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DirectoryMappingRule),
                Box::new(KeywordRule),
                Box::new(ExtensionRule),
                Box::new(UnclassifiedRule),
            ],
        }
    }

    pub fn classify(&self, file: &FileRecord, ctx: &RuleContext) -> ClassificationResult {
        for rule in &self.rules {
            if let Some(m) = rule.attempt(file, ctx) {
                return ClassificationResult {
                    path: file.path.clone(),
                    category_path: m.category_path,
                    tier: m.tier,
                    rule_matched: rule.name().to_string(),
                    reason: m.reason,
                    classified_at: None,
                };
            }
        }
        unreachable!("UnclassifiedRule is total")
    }

    /// Classify every indexed file lacking an active classification
    /// (all files when `force`), stamp the results, and save them.
    /// Files already inside a frozen subtree are left alone.
    pub fn classify_all(
        &self,
        db: &Database,
        ctx: &RuleContext,
        force: bool,
    ) -> Result<(Vec<ClassificationResult>, JobReport)> {
        let mut report = JobReport::new("classify");

        let targets: Vec<FileRecord> = if force {
            db.all_files(false)?
        } else {
            let mut files = Vec::new();
            for path in db.unclassified_paths()? {
                if let Some(rec) = db.get_file(&path)? {
                    files.push(rec);
                }
            }
            files
        };

        let stamp = now_utc();
        let mut results = Vec::new();
        for file in &targets {
            if ctx.taxonomy.is_frozen(&file.path) {
                report.bump("skipped_frozen", 1);
                continue;
            }
            let mut result = self.classify(file, ctx);
            result.classified_at = Some(stamp.clone());
            report.bump(result.tier.as_str(), 1);
            results.push(result);
        }

        db.save_classifications(&results)?;
        report.bump("classified", results.len() as u64);
        report.finish();
        Ok((results, report))
    }
}
