//! Error types for the cache engine.

use std::fmt;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the cache engine.
///
/// The hot path (`put`, `get`, `remove`, `clear`, `snapshot`) never fails;
/// errors come from explicit pruning, scheduling, configuration and the file
/// cache's I/O.
#[derive(Debug, Clone)]
pub enum Error {
    /// A caller-supplied argument is out of range.
    ///
    /// Raised when:
    /// - `schedule_prune` is given a zero interval
    InvalidArgument(String),

    /// The operation is not available for this cache variant.
    ///
    /// Raised when `prune()` is called on a [`WeakCache`](crate::WeakCache):
    /// reclamation there is driven by reference counts, not by a scan.
    Unsupported(String),

    /// Configuration error while building a cache.
    ///
    /// Common causes:
    /// - A capacity given to a timed or unbounded cache
    /// - A default TTL given to an unbounded cache
    /// - Malformed or unknown fields in a JSON config
    ///
    /// **Recovery:** Fix configuration and rebuild.
    ConfigError(String),

    /// Reading a file for the file cache failed.
    IoError(String),

    /// Generic error with custom message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::IoError(msg) => write!(f, "I/O error: {}", msg),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::ConfigError(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}
