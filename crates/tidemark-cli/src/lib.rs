// NOTE: tidemark CLI Architecture Rationale
//
// Why Index-First (not call the remote per command)?
// - Listing a large remote tree is the expensive operation; every
//   read-only command answers from the local SQLite index instead
// - Stale reads are acceptable for reports; mutating jobs re-check
//   the index inside their own transactions
// - Trade-off: `scan` must run before anything else is useful
//
// Why One Write Lease (not per-table locking)?
// - Every mutating job moves or deletes remote entries; two of them
//   interleaved can race on the same paths
// - A single lease row makes "who is holding this up" a one-line answer
// - Trade-off: no parallel jobs, which is fine for a personal archive
//
// Why Phased Migration (not one big move pass)?
// - High-confidence moves should not wait on human review of the rest
// - A persisted per-batch checkpoint lets an interrupted run resume
//   exactly where the log says it stopped

mod args;
mod commands;
pub mod context;
mod handlers;
mod output;

pub use args::{
    Cli, CleanCommand, Commands, DedupCommand, MigrateCommand, OutputFormat, SyncCommand,
    TaxonomyCommand,
};
pub use commands::run;
