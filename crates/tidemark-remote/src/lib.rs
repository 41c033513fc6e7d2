// Access to the remote file tree behind trait seams.
// The engine only sees the traits; FsRemote is the directory-backed
// implementation used for local trees and integration tests.

mod error;
mod fs;
mod retry;
mod traits;

// Public API
pub use error::{Error, Result};
pub use fs::FsRemote;
pub use retry::{RetryPolicy, with_retry};
pub use traits::{
    Listing, Remote, RemoteEntry, RemoteListing, RemoteMeta, RemoteMetadata, RemoteOps,
    RemoteTransfer,
};
