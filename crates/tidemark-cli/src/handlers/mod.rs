pub mod classify;
pub mod clean;
pub mod dedup;
pub mod init;
pub mod migrate;
pub mod scan;
pub mod status;
pub mod sync;
pub mod taxonomy;
