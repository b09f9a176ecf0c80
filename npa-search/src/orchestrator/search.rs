//! Core search orchestrator: plan, aggregate, score, dedup, rank.
//!
//! [`NpaSearcher`] owns a [`DocumentStore`] and composes the planner,
//! aggregator, scorer and deduplicator into the public search operation.
//! Consolidated-version lookup, artifact download and free-text processing
//! are built on the same pieces.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::extract::{extract_mentions, TextExtractor};
use crate::stats::{global_stats, SearchStatistics, SearchStats};
use crate::store::DocumentStore;
use crate::tables::{scoring_weights, ScoringWeights};
use crate::types::{
    DocumentDescriptor, RankedResults, RawCandidate, RawDocumentMention, ScoredCandidate,
};

use super::aggregate::aggregate;
use super::consolidated::{find_consolidated_version, ConsolidatedLookup};
use super::dedup::deduplicate;
use super::planner::plan_queries;
use super::scoring::{RelevanceScorer, ScoreBreakdown};

/// Searches a document registry for loosely described documents.
pub struct NpaSearcher<S> {
    store: S,
    config: SearchConfig,
    weights: ScoringWeights,
    stats: Arc<SearchStats>,
}

/// A mention together with its best registry match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionMatch {
    pub mention: RawDocumentMention,
    pub best: ScoredCandidate,
    /// Total candidates that survived ranking.
    pub candidates: usize,
}

/// A mention whose search raised an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionError {
    pub mention: RawDocumentMention,
    pub error: String,
}

/// Counts from the extraction stage of [`NpaSearcher::process_text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub total_extracted: usize,
    pub acts_extracted: usize,
    pub letters_extracted: usize,
    pub processed_for_search: usize,
    pub failed_chunks: usize,
}

/// Outcome of [`NpaSearcher::process_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    /// Mentions whose best match is a standalone document.
    pub successful: Vec<MentionMatch>,
    /// Mentions with no match above the threshold.
    pub failed: Vec<RawDocumentMention>,
    /// Mentions whose best match is an amending document.
    pub amendments: Vec<MentionMatch>,
    pub errors: Vec<MentionError>,
    pub extraction: ExtractionSummary,
}

impl<S: DocumentStore> NpaSearcher<S> {
    /// Create a searcher reporting to the process-wide statistics.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(store: S, config: SearchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            weights: scoring_weights().clone(),
            stats: global_stats(),
        })
    }

    /// Report to `stats` instead of the process-wide counters.
    pub fn with_stats(mut self, stats: Arc<SearchStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Find registry documents matching `descriptor`, best first.
    ///
    /// # Pipeline
    ///
    /// 1. Validate the descriptor (before any store call)
    /// 2. Plan strategy queries
    /// 3. Run them with pacing, timeout and retry; failed queries are
    ///    logged and skipped
    /// 4. Score candidates, dropping those below the threshold
    /// 5. Deduplicate by identity key
    /// 6. Stable sort by score (descending), truncate to `max_results`
    ///
    /// An empty result is not an error. The configured deadline, if any,
    /// stops untried queries.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidDescriptor`] for a malformed descriptor
    /// - [`SearchError::AllStrategiesFailed`] if every dispatched query
    ///   failed
    pub async fn search(&self, descriptor: &DocumentDescriptor) -> Result<RankedResults, SearchError> {
        let deadline = self.config.deadline().map(|d| Instant::now() + d);
        self.run_search(descriptor, deadline).await
    }

    /// [`search`](Self::search) that stops dispatching queries at `deadline`.
    pub async fn search_with_deadline(
        &self,
        descriptor: &DocumentDescriptor,
        deadline: Instant,
    ) -> Result<RankedResults, SearchError> {
        self.run_search(descriptor, Some(deadline)).await
    }

    async fn run_search(
        &self,
        descriptor: &DocumentDescriptor,
        deadline: Option<Instant>,
    ) -> Result<RankedResults, SearchError> {
        descriptor.validate()?;
        self.stats.record_search();

        let plan = plan_queries(descriptor);
        tracing::debug!(
            doc_type = %descriptor.doc_type,
            number = %descriptor.number,
            queries = plan.len(),
            "search planned"
        );

        let aggregated = aggregate(&self.store, &plan, &self.config, deadline).await;
        if aggregated.all_failed() {
            let detail = aggregated
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.strategy, f.error))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(SearchError::AllStrategiesFailed(detail));
        }
        let found = aggregated.candidates.len();

        let scored = RelevanceScorer::new(&self.weights).score_all(descriptor, aggregated.candidates);
        let mut ranked = deduplicate(scored);
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked.truncate(self.config.max_results);

        if !ranked.is_empty() {
            self.stats.record_success();
        }
        tracing::info!(
            number = %descriptor.number,
            found,
            failed_queries = aggregated.failures.len(),
            returned = ranked.len(),
            best = ranked.first().map_or(0, |r| r.score),
            "search complete"
        );
        Ok(ranked)
    }

    /// Explain how `candidate` scores against `descriptor`.
    pub fn explain_score(
        &self,
        descriptor: &DocumentDescriptor,
        candidate: &RawCandidate,
    ) -> ScoreBreakdown {
        RelevanceScorer::new(&self.weights).breakdown(descriptor, candidate)
    }

    /// Resolve `candidate` to its consolidated version or manual search
    /// instructions.
    pub fn find_consolidated_version(&self, candidate: &RawCandidate) -> ConsolidatedLookup {
        find_consolidated_version(candidate)
    }

    pub fn statistics(&self) -> SearchStatistics {
        self.stats.snapshot()
    }

    /// Download the as-published PDF of `candidate`.
    ///
    /// Uses the artifact timeout; transient failures are retried, a missing
    /// artifact is not.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotFound`] if the candidate has no `eoNumber`
    /// or the store has no artifact for it.
    pub async fn download_document(&self, candidate: &RawCandidate) -> Result<Vec<u8>, SearchError> {
        let eo = candidate.eo_number.trim();
        if eo.is_empty() {
            return Err(SearchError::NotFound(format!(
                "document {} has no eoNumber",
                candidate.number
            )));
        }

        let timeout = self.config.artifact_timeout();
        let store = &self.store;
        let bytes = self
            .config
            .retry
            .execute_when(
                move || async move {
                    match tokio::time::timeout(timeout, store.download_artifact(eo)).await {
                        Ok(result) => result,
                        Err(_) => Err(SearchError::Timeout(format!(
                            "artifact {eo} exceeded {}s",
                            timeout.as_secs()
                        ))),
                    }
                },
                SearchError::is_transient,
            )
            .await?;
        tracing::info!(eo_number = eo, bytes = bytes.len(), "artifact downloaded");
        Ok(bytes)
    }

    /// Extract document mentions from `text` and search each of them.
    ///
    /// Letters are searched only when `include_letters` is set in the
    /// config. Blank text yields an empty report without calling the
    /// extractor.
    pub async fn process_text<X: TextExtractor>(&self, extractor: &X, text: &str) -> ProcessingReport {
        let mut report = ProcessingReport::default();
        if text.trim().is_empty() {
            tracing::warn!("empty text, nothing to process");
            return report;
        }

        let extracted = extract_mentions(extractor, text, &self.config).await;
        let mut to_search = extracted.acts.clone();
        if self.config.include_letters {
            to_search.extend(extracted.letters.iter().cloned());
        }
        report.extraction = ExtractionSummary {
            total_extracted: extracted.all.len(),
            acts_extracted: extracted.acts.len(),
            letters_extracted: extracted.letters.len(),
            processed_for_search: to_search.len(),
            failed_chunks: extracted.failed_chunks,
        };

        for mention in to_search {
            match self.search(&mention.to_descriptor()).await {
                Ok(ranked) => {
                    let candidates = ranked.len();
                    match ranked.into_iter().next() {
                        Some(best) if best.is_amendment => report.amendments.push(MentionMatch {
                            mention,
                            best,
                            candidates,
                        }),
                        Some(best) => report.successful.push(MentionMatch {
                            mention,
                            best,
                            candidates,
                        }),
                        None => report.failed.push(mention),
                    }
                }
                Err(err) => {
                    tracing::warn!(number = %mention.number, error = %err, "mention search failed");
                    report.errors.push(MentionError {
                        mention,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            successful = report.successful.len(),
            amendments = report.amendments.len(),
            failed = report.failed.len(),
            errors = report.errors.len(),
            "text processed"
        );
        report
    }
}
