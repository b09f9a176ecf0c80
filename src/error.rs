//! Error types for the npa application.

use npa_search::SearchError;

/// Top-level error type for the registry client and host bridge.
#[derive(Debug, thiserror::Error)]
pub enum NpaError {
    /// Error from the search engine core.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// HTTP client construction error.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Malformed host command or payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NpaError>;
