use anyhow::{Context, Result};
use tidemark_engine::GovernanceConfig;
use tidemark_index::Database;

use crate::context::ExecutionContext;

pub fn handle(ctx: &ExecutionContext) -> Result<()> {
    std::fs::create_dir_all(&ctx.data_dir)
        .with_context(|| format!("failed to create {}", ctx.data_dir.display()))?;

    // Opening creates the store and applies schema migrations; safe to
    // re-run on an existing index.
    let db = Database::open(&ctx.db_path())?;
    drop(db);

    let config_path = ctx.config_path();
    if config_path.exists() {
        println!("config exists: {}", config_path.display());
    } else {
        GovernanceConfig::default().save_to(&config_path)?;
        println!("wrote starter config: {}", config_path.display());
        println!("edit [remote] and [scan] before the first `tidemark scan`");
    }
    println!("index store: {}", ctx.db_path().display());
    Ok(())
}
