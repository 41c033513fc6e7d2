use anyhow::Result;
use tidemark_engine::{Classifier, RuleContext};
use tidemark_types::truncate_path;

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle(ctx: &ExecutionContext, force: bool, detail: bool) -> Result<()> {
    let db = ctx.db()?;
    let _lease = db.acquire_lease("classify")?;

    let taxonomy = ctx.config.taxonomy()?;
    let rule_ctx = RuleContext {
        taxonomy: &taxonomy,
        mappings: &ctx.config.classifier.directory_mappings,
        extension_hints: &ctx.config.classifier.extension_hints,
    };

    let (results, report) = Classifier::new().classify_all(&db, &rule_ctx, force)?;

    if ctx.format == OutputFormat::Json {
        if detail {
            return output::print_json(&results);
        }
        return output::print_report(&report, ctx.format);
    }

    if detail {
        for result in &results {
            println!(
                "{:6} {} -> {} ({})",
                output::tier_label(result.tier),
                truncate_path(&result.path, 60),
                result.category_path,
                result.reason
            );
        }
    }
    output::print_report(&report, ctx.format)
}
