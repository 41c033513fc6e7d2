use anyhow::{Result, bail};
use tidemark_engine::{DedupPolicy, Deduplicator};
use tidemark_types::{RiskTier, format_size, truncate_path};

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle_report(ctx: &ExecutionContext, detail: bool) -> Result<()> {
    let db = ctx.db()?;
    let taxonomy = ctx.config.taxonomy()?;
    let policy = DedupPolicy::from_config(&ctx.config);
    let groups = Deduplicator::new(&db).report(&taxonomy, &policy)?;

    if ctx.format == OutputFormat::Json {
        return output::print_json(&groups);
    }

    let mut reclaimable = 0i64;
    let mut by_tier = [0usize; 3];
    for group in &groups {
        reclaimable += group.reclaimable();
        by_tier[match group.tier {
            RiskTier::Safe => 0,
            RiskTier::Review => 1,
            RiskTier::Manual => 2,
        }] += 1;
    }

    println!(
        "{} duplicate groups (safe {}, review {}, manual {}), {} reclaimable",
        groups.len(),
        by_tier[0],
        by_tier[1],
        by_tier[2],
        format_size(reclaimable)
    );

    if detail {
        for group in &groups {
            println!(
                "{:6} {} x{}  keep {}",
                output::risk_label(group.tier),
                format_size(group.size_bytes),
                group.candidates.len() + 1,
                truncate_path(&group.survivor.path, 60)
            );
            for candidate in &group.candidates {
                println!("         drop {}", truncate_path(&candidate.path, 60));
            }
        }
    }
    Ok(())
}

pub fn handle_apply(ctx: &ExecutionContext, tier: &str, dry_run: bool) -> Result<()> {
    let max_tier = RiskTier::parse(tier)?;
    if max_tier == RiskTier::Manual {
        bail!("manual-tier groups must be resolved by hand; use `dedup report --detail`");
    }

    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let _lease = db.acquire_lease("dedup")?;

    let taxonomy = ctx.config.taxonomy()?;
    let policy = DedupPolicy::from_config(&ctx.config);
    let dedup = Deduplicator::new(&db);
    let groups = dedup.report(&taxonomy, &policy)?;
    let report = dedup.apply(&remote, &groups, max_tier, dry_run)?;
    output::print_report(&report, ctx.format)
}
