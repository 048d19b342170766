use std::fmt;

/// Result type alias for Volley core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Volley core operations
#[derive(Debug)]
pub enum Error {
    /// Invalid pacer, ticker or schedule parameters
    Config(String),

    /// Tick stream errors (stream finished, ticker thread lost)
    Ticker(String),

    /// I/O errors while loading schedule profiles
    Io(std::io::Error),

    /// Other errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "Configuration error: {msg}"),
            Error::Ticker(msg) => write!(f, "Worker ticker error: {msg}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(format!("{err:#}"))
    }
}
