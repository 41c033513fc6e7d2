//! Testing infrastructure for tidemark.
//!
//! - `MemoryRemote`: scriptable in-memory remote with fault injection
//!   (truncated listings, failing metadata batches, occupied destinations)
//! - `fixtures`: shared taxonomy and mapping builders

pub mod fixtures;
mod remote;

pub use remote::MemoryRemote;
