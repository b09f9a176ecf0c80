//! Trait definition for document-store backends.
//!
//! The search engine never talks to the registry directly; it issues
//! [`QuerySpec`]s through a [`DocumentStore`]. Implementations own their
//! transport, request encoding and response decoding.

use std::future::Future;

use crate::error::SearchError;
use crate::types::{QuerySpec, RawCandidate};

/// A queryable registry of legal documents.
///
/// Every method is treated as fallible, retryable and rate-limited: callers
/// wrap each call in a timeout and a [`crate::retry::RetryPolicy`] and pace
/// consecutive calls.
///
/// All implementations must be `Send + Sync` so strategies can run
/// concurrently.
pub trait DocumentStore: Send + Sync {
    /// Run one planned query and return every matching record.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Network`] or [`SearchError::Parse`] when the
    /// request or response fails. An empty result is `Ok(vec![])`.
    fn query(
        &self,
        spec: &QuerySpec,
    ) -> impl Future<Output = Result<Vec<RawCandidate>, SearchError>> + Send;

    /// Fetch a single record by its external reference id (`eoNumber`).
    ///
    /// Returns `Ok(None)` when no such record exists.
    fn fetch_by_external_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<RawCandidate>, SearchError>> + Send;

    /// Download the published artifact (PDF) for an external reference id.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotFound`] when the artifact does not exist.
    fn download_artifact(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Vec<u8>, SearchError>> + Send;
}
