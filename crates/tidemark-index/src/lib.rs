// SQLite mirror of the remote tree.
// Stores the snapshot plus scan/classification/migration history;
// all other crates hold only transient views obtained through queries here.

mod db;
mod error;
mod queries;
mod schema;

// Public API
pub use db::{Database, IndexStats, WriteLease};
pub use error::{Error, Result};
