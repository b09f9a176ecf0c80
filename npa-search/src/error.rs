//! Error types for the npa-search crate.
//!
//! Absence of a match is not an error: a search that finds nothing returns an
//! empty list. Consolidated-version fallback is likewise a normal outcome.

/// Errors that can occur while searching for legal documents.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The caller's descriptor is missing a required field or its number is
    /// too short to search for.
    #[error("invalid document descriptor: {0}")]
    InvalidDescriptor(String),

    /// A request to the document store failed in a way that may succeed on retry.
    #[error("network error: {0}")]
    Network(String),

    /// A request did not complete within its timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The requested artifact does not exist in the store.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Every dispatched query failed, so no strategy could report a result.
    #[error("all search strategies failed: {0}")]
    AllStrategiesFailed(String),

    /// A store response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The text extractor failed on a chunk.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Whether repeating the same request could plausibly succeed.
    ///
    /// `NotFound`, descriptor and config errors are final.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Parse(_) | Self::Extraction(_)
        )
    }
}

/// Convenience type alias for npa-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
