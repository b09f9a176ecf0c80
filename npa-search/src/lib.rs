//! # npa-search
//!
//! Multi-strategy search and relevance ranking for official legal documents.
//!
//! Given a loosely specified document (type, number, maybe a title), this
//! crate queries a document registry with several strategies, merges and
//! deduplicates the hits, scores each one against the query with a fixed
//! weighted rubric and returns the best candidates first.
//!
//! ## Design
//!
//! - The registry is a [`DocumentStore`] capability; transport lives elsewhere
//! - Every query is paced, time-limited and retried with exponential backoff
//! - Partial failure: a failing strategy is logged and skipped
//! - Reference tables (weights, known documents, amendment vocabulary) are
//!   built once and shared read-only
//! - Statistics are an injected counter service
//!
//! ## Logging
//!
//! Query text is logged only at debug and trace level.

pub mod config;
pub mod error;
pub mod extract;
pub mod normalize;
pub mod orchestrator;
pub mod retry;
pub mod stats;
pub mod store;
pub mod tables;
pub mod types;

pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use extract::{ExtractedMentions, TextExtractor};
pub use orchestrator::consolidated::{find_consolidated_version, ConsolidatedLookup};
pub use orchestrator::scoring::{RelevanceScorer, ScoreBreakdown};
pub use orchestrator::search::{NpaSearcher, ProcessingReport};
pub use retry::RetryPolicy;
pub use stats::{SearchStatistics, SearchStats};
pub use store::DocumentStore;
pub use types::{
    DocumentDescriptor, QuerySpec, QueryTarget, RankedResults, RawCandidate, RawDocumentMention,
    ScoredCandidate, Strategy,
};

/// Counters of every searcher sharing the process-wide statistics.
///
/// # Examples
///
/// ```
/// let stats = npa_search::statistics();
/// assert!(stats.successful_searches <= stats.total_searches);
/// ```
pub fn statistics() -> SearchStatistics {
    stats::global_stats().snapshot()
}
