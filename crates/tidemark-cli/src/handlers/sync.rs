use anyhow::Result;
use tidemark_engine::{SyncDirection, SyncOptions, Syncer};

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle(ctx: &ExecutionContext, push: bool, dry_run: bool) -> Result<()> {
    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let direction = if push {
        SyncDirection::Push
    } else {
        SyncDirection::Pull
    };
    let _lease = db.acquire_lease("sync")?;

    let opts = SyncOptions::from_config(&ctx.config);
    let syncer = Syncer::new(&db);
    let actions = syncer.plan(&opts)?;

    if ctx.verbose && ctx.format == OutputFormat::Plain {
        for action in &actions {
            println!("{:?} {}", action.kind, action.remote_path);
        }
    }

    let report = syncer.execute(&remote, direction, &actions, &opts, dry_run)?;
    output::print_report(&report, ctx.format)
}
