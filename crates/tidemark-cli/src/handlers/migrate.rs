use std::io::{BufRead, Write};

use anyhow::Result;
use tidemark_engine::{DecisionSource, FixedDecision, MigrateOptions, Migrator, MoveProposal};
use tidemark_types::{Decision, MigrationPhase, truncate_path};

use crate::args::OutputFormat;
use crate::context::ExecutionContext;
use crate::output;

pub fn handle_plan(ctx: &ExecutionContext) -> Result<()> {
    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let taxonomy = ctx.config.taxonomy()?;
    let proposals = Migrator::new(&db, &remote, &taxonomy).plan()?;

    if ctx.format == OutputFormat::Json {
        let rows: Vec<serde_json::Value> = proposals
            .iter()
            .map(|p| {
                serde_json::json!({
                    "source_path": p.source_path,
                    "destination_path": p.destination_path,
                    "category_path": p.category_path,
                    "tier": p.tier.as_str(),
                    "reason": p.reason,
                })
            })
            .collect();
        return output::print_json(&rows);
    }

    for proposal in &proposals {
        println!(
            "{:6} {} -> {}",
            output::tier_label(proposal.tier),
            truncate_path(&proposal.source_path, 60),
            proposal.destination_path
        );
    }
    println!("{} proposed moves", proposals.len());
    Ok(())
}

pub fn handle_start(ctx: &ExecutionContext) -> Result<()> {
    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let taxonomy = ctx.config.taxonomy()?;
    let batch_id = Migrator::new(&db, &remote, &taxonomy).start_batch()?;
    println!("batch {}", batch_id);
    println!("next: tidemark migrate run {} --phase 1", batch_id);
    Ok(())
}

pub fn handle_run(
    ctx: &ExecutionContext,
    batch_id: &str,
    phase: i64,
    dry_run: bool,
    yes: bool,
    defer_all: bool,
) -> Result<()> {
    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let taxonomy = ctx.config.taxonomy()?;
    let _lease = db.acquire_lease("migrate")?;

    let phase = MigrationPhase::from_number(phase)?;
    let opts = MigrateOptions {
        dry_run: dry_run || ctx.config.migration.always_dry_run,
    };

    let mut fixed;
    let mut stdin;
    let decisions: &mut dyn DecisionSource = if yes {
        fixed = FixedDecision(Decision::Accept);
        &mut fixed
    } else if defer_all {
        fixed = FixedDecision(Decision::Defer);
        &mut fixed
    } else {
        stdin = StdinDecisions;
        &mut stdin
    };

    let report = Migrator::new(&db, &remote, &taxonomy).run_phase(
        batch_id,
        phase,
        decisions,
        opts,
    )?;
    output::print_report(&report, ctx.format)
}

pub fn handle_rollback(ctx: &ExecutionContext, batch_id: &str, dry_run: bool) -> Result<()> {
    let db = ctx.db()?;
    let remote = ctx.remote()?;
    let taxonomy = ctx.config.taxonomy()?;
    let _lease = db.acquire_lease("rollback")?;

    let report = Migrator::new(&db, &remote, &taxonomy)
        .rollback(batch_id, MigrateOptions { dry_run })?;
    output::print_report(&report, ctx.format)
}

pub fn handle_batches(ctx: &ExecutionContext) -> Result<()> {
    let db = ctx.db()?;
    let batches = db.migration_batches()?;

    if ctx.format == OutputFormat::Json {
        return output::print_json(&batches);
    }

    if batches.is_empty() {
        println!("no migration batches; run `tidemark migrate start`");
        return Ok(());
    }
    for batch in &batches {
        let checkpoint = match batch.last_completed_phase {
            None => "not started".to_string(),
            Some(phase) => format!("completed {}", phase.label()),
        };
        println!("{}  {}  {}", batch.batch_id, batch.created_at, checkpoint);
    }
    Ok(())
}

/// Interactive review for phase 3: one prompt per proposal, answered
/// on stdin. EOF or an unrecognized answer defers, so a piped run can
/// never accidentally accept a move.
struct StdinDecisions;

impl DecisionSource for StdinDecisions {
    fn decide(&mut self, proposal: &MoveProposal) -> Decision {
        print!(
            "{:6} {} -> {} [a]ccept/[r]eject/[d]efer: ",
            proposal.tier.as_str(),
            truncate_path(&proposal.source_path, 60),
            proposal.destination_path
        );
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).unwrap_or(0) == 0 {
            return Decision::Defer;
        }
        match line.trim() {
            "a" | "accept" | "y" => Decision::Accept,
            "r" | "reject" | "n" => Decision::Reject,
            _ => Decision::Defer,
        }
    }
}
