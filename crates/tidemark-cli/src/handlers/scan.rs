use anyhow::Result;
use tidemark_engine::{ScanOptions, Scanner};

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle(ctx: &ExecutionContext, root_override: Option<String>) -> Result<()> {
    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let _lease = db.acquire_lease("scan")?;

    let mut opts = ScanOptions::from_config(&ctx.config);
    if let Some(root) = root_override {
        opts.root = root;
    }

    let (batch, report) = Scanner::new(&db).run(&remote, &remote, &opts)?;

    if ctx.format == OutputFormat::Plain {
        println!(
            "scan {} of {}: {}",
            &batch.id[..8.min(batch.id.len())],
            batch.root,
            if batch.complete {
                "bulk listing"
            } else {
                "fallback walk"
            }
        );
    }
    output::print_report(&report, ctx.format)
}
