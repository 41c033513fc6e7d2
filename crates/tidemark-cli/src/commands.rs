use anyhow::Result;

use super::args::{
    Cli, CleanCommand, Commands, DedupCommand, MigrateCommand, SyncCommand, TaxonomyCommand,
};
use super::context::ExecutionContext;
use super::handlers;

pub fn run(cli: Cli) -> Result<()> {
    let ctx = ExecutionContext::new(cli.data_dir.as_deref(), cli.format, cli.verbose)?;

    match cli.command {
        Commands::Init => handlers::init::handle(&ctx),

        Commands::Scan { root } => handlers::scan::handle(&ctx, root),

        Commands::Classify { force, detail } => handlers::classify::handle(&ctx, force, detail),

        Commands::Taxonomy { command } => match command {
            TaxonomyCommand::Show => handlers::taxonomy::handle_show(&ctx),
        },

        Commands::Migrate { command } => match command {
            MigrateCommand::Plan => handlers::migrate::handle_plan(&ctx),
            MigrateCommand::Start => handlers::migrate::handle_start(&ctx),
            MigrateCommand::Run {
                batch_id,
                phase,
                dry_run,
                yes,
                defer_all,
            } => handlers::migrate::handle_run(&ctx, &batch_id, phase, dry_run, yes, defer_all),
            MigrateCommand::Rollback { batch_id, dry_run } => {
                handlers::migrate::handle_rollback(&ctx, &batch_id, dry_run)
            }
            MigrateCommand::Batches => handlers::migrate::handle_batches(&ctx),
        },

        Commands::Dedup { command } => match command {
            DedupCommand::Report { detail } => handlers::dedup::handle_report(&ctx, detail),
            DedupCommand::Apply { tier, dry_run } => {
                handlers::dedup::handle_apply(&ctx, &tier, dry_run)
            }
        },

        Commands::Sync { command } => match command {
            SyncCommand::Push { dry_run } => handlers::sync::handle(&ctx, true, dry_run),
            SyncCommand::Pull { dry_run } => handlers::sync::handle(&ctx, false, dry_run),
        },

        Commands::Clean { command } => match command {
            CleanCommand::Report => handlers::clean::handle_report(&ctx),
            CleanCommand::Apply { dry_run } => handlers::clean::handle_apply(&ctx, dry_run),
        },

        Commands::Status { clear_lease } => handlers::status::handle(&ctx, clear_lease),
    }
}
