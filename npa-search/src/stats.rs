//! Cumulative search statistics.
//!
//! [`SearchStats`] is a counter service injected into the orchestrator. Both
//! counters are monotonic atomics, so concurrent searches never lose an
//! increment. A process-wide instance is available through [`global_stats`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

/// Thread-safe search counters.
#[derive(Debug, Default)]
pub struct SearchStats {
    total: AtomicU64,
    successful: AtomicU64,
}

/// A point-in-time copy of [`SearchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatistics {
    pub total_searches: u64,
    pub successful_searches: u64,
    /// Percentage of searches that produced at least one result; 0 when no
    /// search has run.
    pub success_rate: f64,
}

impl SearchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a search that passed validation.
    pub fn record_search(&self) {
        self.total.fetch_add(1, Ordering::SeqCst);
    }

    /// Count a search that returned a non-empty result.
    pub fn record_success(&self) {
        self.successful.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> SearchStatistics {
        // Read `successful` first so the snapshot never shows more successes
        // than searches.
        let successful_searches = self.successful.load(Ordering::SeqCst);
        let total_searches = self.total.load(Ordering::SeqCst);
        let success_rate = if total_searches == 0 {
            0.0
        } else {
            successful_searches as f64 / total_searches as f64 * 100.0
        };
        SearchStatistics {
            total_searches,
            successful_searches,
            success_rate,
        }
    }
}

static GLOBAL_STATS: OnceLock<Arc<SearchStats>> = OnceLock::new();

/// Process-wide counters, created empty on first access.
pub fn global_stats() -> Arc<SearchStats> {
    Arc::clone(GLOBAL_STATS.get_or_init(|| Arc::new(SearchStats::new())))
}
