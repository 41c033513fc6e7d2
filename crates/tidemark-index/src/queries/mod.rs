pub mod classification;
pub mod file;
pub mod lease;
pub mod migration;
pub mod scan;
