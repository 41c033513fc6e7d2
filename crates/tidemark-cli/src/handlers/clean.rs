use anyhow::Result;
use tidemark_engine::{CleanOptions, Cleaner, DedupPolicy};
use tidemark_types::{format_size, truncate_path};

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle_report(ctx: &ExecutionContext) -> Result<()> {
    let db = ctx.db()?;
    let taxonomy = ctx.config.taxonomy()?;
    let policy = DedupPolicy::from_config(&ctx.config);
    let opts = CleanOptions::from_config(&ctx.config);
    let clean = Cleaner::new(&db).report(&taxonomy, &policy, &opts)?;

    if ctx.format == OutputFormat::Json {
        return output::print_json(&clean);
    }

    println!(
        "duplicates: {} groups, {} reclaimable",
        clean.duplicate_groups.len(),
        format_size(clean.duplicate_reclaimable_bytes)
    );
    println!("large files: {}", clean.large_files.len());
    for file in clean.large_files.iter().take(10) {
        println!(
            "  {} {}",
            format_size(file.size_bytes),
            truncate_path(&file.path, 70)
        );
    }
    println!("expired files: {}", clean.expired_files.len());
    println!("empty directories: {}", clean.empty_dirs.len());
    Ok(())
}

pub fn handle_apply(ctx: &ExecutionContext, dry_run: bool) -> Result<()> {
    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let _lease = db.acquire_lease("clean")?;

    let taxonomy = ctx.config.taxonomy()?;
    let policy = DedupPolicy::from_config(&ctx.config);
    let opts = CleanOptions::from_config(&ctx.config);
    let cleaner = Cleaner::new(&db);
    let clean = cleaner.report(&taxonomy, &policy, &opts)?;
    let report = cleaner.apply(&remote, &clean, dry_run)?;
    output::print_report(&report, ctx.format)
}
