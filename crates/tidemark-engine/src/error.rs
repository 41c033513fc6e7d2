use std::fmt;

/// Result type for tidemark-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the engine layer
#[derive(Debug)]
pub enum Error {
    /// Index store operation failed
    Index(tidemark_index::Error),

    /// Remote operation failed beyond per-item recovery
    Remote(tidemark_remote::Error),

    /// Configuration invalid or unreadable
    Config(String),

    /// TOML deserialization failed
    TomlDe(toml::de::Error),

    /// TOML serialization failed
    TomlSer(toml::ser::Error),

    /// IO operation failed
    Io(std::io::Error),

    /// Job-level precondition violated (wrong phase, unknown batch, ...)
    Job(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Index(err) => write!(f, "Index error: {}", err),
            Error::Remote(err) => write!(f, "Remote error: {}", err),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
            Error::TomlDe(err) => write!(f, "Config parse error: {}", err),
            Error::TomlSer(err) => write!(f, "Config write error: {}", err),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Job(msg) => write!(f, "Job error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Index(err) => Some(err),
            Error::Remote(err) => Some(err),
            Error::TomlDe(err) => Some(err),
            Error::TomlSer(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Config(_) | Error::Job(_) => None,
        }
    }
}

impl From<tidemark_index::Error> for Error {
    fn from(err: tidemark_index::Error) -> Self {
        Error::Index(err)
    }
}

impl From<tidemark_remote::Error> for Error {
    fn from(err: tidemark_remote::Error) -> Self {
        Error::Remote(err)
    }
}

impl From<tidemark_types::Error> for Error {
    fn from(err: tidemark_types::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::TomlDe(err)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::TomlSer(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
