use anyhow::Result;
use tidemark_types::format_size;

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle(ctx: &ExecutionContext, clear_lease: bool) -> Result<()> {
    let db = ctx.db()?;

    if clear_lease {
        db.clear_lease()?;
        println!("write lease cleared");
        return Ok(());
    }

    let stats = db.stats()?;
    let lease = db.lease_holder()?;

    if ctx.format == OutputFormat::Json {
        let value = serde_json::json!({
            "stats": stats,
            "lease": lease.map(|(job, pid, acquired_at)| serde_json::json!({
                "job": job,
                "pid": pid,
                "acquired_at": acquired_at,
            })),
        });
        return output::print_json(&value);
    }

    println!(
        "{} files, {} directories, {} indexed",
        stats.file_count,
        stats.dir_count,
        format_size(stats.total_size_bytes as i64)
    );
    println!("{} classified", stats.classified_count);
    match &stats.last_scan {
        Some(scan) => println!(
            "last scan: {} ({} discovered, {} updated, {} errored)",
            scan.started_at, scan.discovered, scan.updated, scan.errored
        ),
        None => println!("last scan: never; run `tidemark scan`"),
    }
    match lease {
        Some((job, pid, acquired_at)) => println!(
            "write lease: held by {} (pid {}) since {}",
            job, pid, acquired_at
        ),
        None => println!("write lease: free"),
    }
    Ok(())
}
