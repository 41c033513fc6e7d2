// Shared data model for the tidemark workspace.
// Schemas only; persistence lives in tidemark-index, behavior in tidemark-engine.

pub mod classify;
pub mod dedup;
pub mod error;
pub mod file;
pub mod migrate;
pub mod scan;
pub mod taxonomy;
mod util;

pub use classify::*;
pub use dedup::*;
pub use error::{Error, Result};
pub use file::*;
pub use migrate::*;
pub use scan::*;
pub use taxonomy::*;
pub use util::*;
