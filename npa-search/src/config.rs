//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls result size, request pacing, timeouts, retries
//! and text chunking. The defaults are tuned for polite use of the public
//! registry API.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::retry::RetryPolicy;

/// Characters at the end of a chunk searched for a natural break point.
pub const CHUNK_BREAK_WINDOW: usize = 300;

/// Configuration for search and text-processing operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of ranked results returned per search.
    pub max_results: usize,
    /// Pause in milliseconds between consecutive requests of one sequence.
    pub request_delay_ms: u64,
    /// Per-attempt timeout for ordinary store requests.
    pub request_timeout_seconds: u64,
    /// Per-attempt timeout for artifact downloads.
    pub artifact_timeout_seconds: u64,
    /// Retry schedule applied to every store and extractor call.
    pub retry: RetryPolicy,
    /// Run strategies concurrently. Requests within one strategy stay
    /// sequential and paced either way.
    pub concurrent_strategies: bool,
    /// Stop dispatching new queries once a search has run this long.
    pub deadline_seconds: Option<u64>,
    /// Maximum characters per chunk sent to the text extractor.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Whether letters found in text are searched as well as normative acts.
    pub include_letters: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            request_delay_ms: 500,
            request_timeout_seconds: 10,
            artifact_timeout_seconds: 60,
            retry: RetryPolicy::default(),
            concurrent_strategies: false,
            deadline_seconds: None,
            chunk_size: 5000,
            chunk_overlap: 500,
            include_letters: true,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `max_results` must be greater than 0
    /// - both timeouts must be greater than 0
    /// - `retry.max_attempts` must be greater than 0
    /// - `retry.backoff_multiplier` must be at least 1.0
    /// - `chunk_size` must exceed `chunk_overlap` plus the break window
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_results == 0 {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.request_timeout_seconds == 0 || self.artifact_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeouts must be greater than 0".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(SearchError::Config(
                "retry.max_attempts must be greater than 0".into(),
            ));
        }
        if !(self.retry.backoff_multiplier >= 1.0) {
            return Err(SearchError::Config(
                "retry.backoff_multiplier must be >= 1.0".into(),
            ));
        }
        if self.chunk_size <= self.chunk_overlap + CHUNK_BREAK_WINDOW {
            return Err(SearchError::Config(format!(
                "chunk_size must exceed chunk_overlap + {CHUNK_BREAK_WINDOW}"
            )));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn artifact_timeout(&self) -> Duration {
        Duration::from_secs(self.artifact_timeout_seconds)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_seconds.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert_eq!(config.max_results, 10);
        assert_eq!(config.request_delay(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.artifact_timeout(), Duration::from_secs(60));
        assert!(!config.concurrent_strategies);
        assert!(config.deadline().is_none());
        assert!(config.include_letters);
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(SearchConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_max_results_rejected() {
        let config = SearchConfig {
            max_results: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_results"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            artifact_timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeouts"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = SearchConfig {
            retry: RetryPolicy::default().with_max_attempts(0),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn shrinking_backoff_rejected() {
        let config = SearchConfig {
            retry: RetryPolicy::default().with_backoff_multiplier(0.5),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn chunk_overlap_too_large_rejected() {
        let config = SearchConfig {
            chunk_size: 700,
            chunk_overlap: 500,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn zero_delay_valid() {
        let config = SearchConfig {
            request_delay_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"max_results": 5, "retry": {"max_attempts": 2}}"#)
                .expect("parse");
        assert_eq!(config.max_results, 5);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.base_delay_ms, 1000);
        assert_eq!(config.request_delay_ms, 500);
    }
}
