use std::fmt;

/// Result type for tidemark-index operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the index layer
#[derive(Debug)]
pub enum Error {
    /// Database operation failed
    Database(rusqlite::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// The store holds state this build cannot decode. Fatal for the
    /// current job: the store refuses to proceed rather than rebuild.
    Corrupt(String),

    /// Another governance job holds the write lease
    LeaseHeld(String),

    /// A status update would move a migration entry backwards
    InvalidTransition(String),

    /// Query-specific error (invalid input, not found, etc.)
    Query(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "Database error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Corrupt(msg) => write!(
                f,
                "Index store is unreadable: {}. Refusing to proceed; restore from backup or re-initialize explicitly.",
                msg
            ),
            Error::LeaseHeld(msg) => write!(f, "Write lease unavailable: {}", msg),
            Error::InvalidTransition(msg) => write!(f, "Invalid status transition: {}", msg),
            Error::Query(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<tidemark_types::Error> for Error {
    fn from(err: tidemark_types::Error) -> Self {
        // A row we wrote but can no longer decode means the store and the
        // binary disagree about the schema's value domain.
        Error::Corrupt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_error_refuses_to_proceed() {
        let err = Error::Corrupt("unknown migration status: done".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Refusing to proceed"));
    }

    #[test]
    fn test_decode_failure_maps_to_corrupt() {
        let types_err = tidemark_types::Error::Decode("unknown risk tier: never".to_string());
        let err = Error::from(types_err);
        assert!(matches!(err, Error::Corrupt(_)));
    }
}
