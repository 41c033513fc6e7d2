use std::fmt;

/// Result type for tidemark-remote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the remote layer
#[derive(Debug)]
pub enum Error {
    /// IO operation failed
    Io(std::io::Error),

    /// Directory traversal failed mid-walk
    WalkDir(walkdir::Error),

    /// Remote path does not exist
    NotFound(String),

    /// Destination already occupied; the caller decides whether to
    /// rename around it or skip
    Conflict(String),

    /// Transient remote failure, safe to retry
    Transient(String),

    /// Any other remote-side failure
    Remote(String),
}

impl Error {
    /// Whether the retry layer may re-attempt the operation.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::WalkDir(err) => write!(f, "Directory traversal error: {}", err),
            Error::NotFound(path) => write!(f, "Remote path not found: {}", path),
            Error::Conflict(path) => write!(f, "Destination already exists: {}", path),
            Error::Transient(msg) => write!(f, "Transient remote error: {}", msg),
            Error::Remote(msg) => write!(f, "Remote error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDir(err)
    }
}
