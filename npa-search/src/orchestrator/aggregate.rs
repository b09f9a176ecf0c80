//! Runs a query plan against a [`DocumentStore`] and concatenates the hits.
//!
//! Each query gets its own timeout and retry schedule. Within a sequence,
//! consecutive requests are separated by the configured pause. A query that
//! still fails after retries is logged and left out; it never fails the
//! whole plan.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::store::DocumentStore;
use crate::types::{QuerySpec, QueryTarget, RawCandidate, Strategy};

/// A query that failed after exhausting its retries.
#[derive(Debug, Clone)]
pub struct QueryFailure {
    pub strategy: Strategy,
    pub target: QueryTarget,
    pub error: String,
}

/// Combined output of a query plan.
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    /// Every hit, in plan order then store order.
    pub candidates: Vec<RawCandidate>,
    /// Queries actually sent to the store.
    pub dispatched: usize,
    /// Queries that failed after retries.
    pub failures: Vec<QueryFailure>,
    /// Queries never sent because the deadline passed.
    pub skipped: usize,
}

impl Aggregated {
    /// True when at least one query was sent and every sent query failed.
    pub fn all_failed(&self) -> bool {
        self.dispatched > 0 && self.failures.len() == self.dispatched
    }
}

enum Outcome {
    Done(Result<Vec<RawCandidate>, SearchError>),
    Skipped,
}

/// Execute `plan` against `store`.
///
/// With `config.concurrent_strategies` set, each strategy runs as its own
/// sequence and sequences run concurrently; otherwise the whole plan is one
/// sequence. Either way no strategy has more than one request in flight,
/// and results come back in plan order.
///
/// Once `deadline` has passed, queries that have not started are skipped.
pub async fn aggregate<S: DocumentStore>(
    store: &S,
    plan: &[QuerySpec],
    config: &SearchConfig,
    deadline: Option<Instant>,
) -> Aggregated {
    let sequences: Vec<Vec<usize>> = if config.concurrent_strategies {
        group_by_strategy(plan)
    } else {
        vec![(0..plan.len()).collect()]
    };

    let runs = sequences
        .iter()
        .map(|indices| run_sequence(store, plan, indices, config, deadline));
    let mut outcomes: Vec<(usize, Outcome)> = futures::future::join_all(runs)
        .await
        .into_iter()
        .flatten()
        .collect();
    outcomes.sort_by_key(|(index, _)| *index);

    let mut aggregated = Aggregated::default();
    for (index, outcome) in outcomes {
        let spec = &plan[index];
        match outcome {
            Outcome::Skipped => aggregated.skipped += 1,
            Outcome::Done(Ok(hits)) => {
                aggregated.dispatched += 1;
                aggregated.candidates.extend(hits);
            }
            Outcome::Done(Err(err)) => {
                aggregated.dispatched += 1;
                tracing::warn!(strategy = %spec.strategy, error = %err, "query failed after retries");
                aggregated.failures.push(QueryFailure {
                    strategy: spec.strategy,
                    target: spec.target.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    if aggregated.skipped > 0 {
        tracing::info!(skipped = aggregated.skipped, "deadline reached, remaining queries skipped");
    }
    aggregated
}

/// Plan indices grouped by strategy, in first-appearance order.
fn group_by_strategy(plan: &[QuerySpec]) -> Vec<Vec<usize>> {
    let mut groups: Vec<(Strategy, Vec<usize>)> = Vec::new();
    for (index, spec) in plan.iter().enumerate() {
        match groups.iter_mut().find(|(s, _)| *s == spec.strategy) {
            Some((_, indices)) => indices.push(index),
            None => groups.push((spec.strategy, vec![index])),
        }
    }
    groups.into_iter().map(|(_, indices)| indices).collect()
}

async fn run_sequence<S: DocumentStore>(
    store: &S,
    plan: &[QuerySpec],
    indices: &[usize],
    config: &SearchConfig,
    deadline: Option<Instant>,
) -> Vec<(usize, Outcome)> {
    let expired = || deadline.is_some_and(|d| Instant::now() >= d);
    let mut outcomes = Vec::with_capacity(indices.len());
    for (position, &index) in indices.iter().enumerate() {
        if position > 0 && !expired() && !config.request_delay().is_zero() {
            tokio::time::sleep(config.request_delay()).await;
        }
        if expired() {
            outcomes.extend(indices[position..].iter().map(|&i| (i, Outcome::Skipped)));
            break;
        }
        let result = run_query(store, &plan[index], config).await;
        outcomes.push((index, Outcome::Done(result)));
    }
    outcomes
}

/// One query with per-attempt timeout and retries. Only transient errors
/// are retried.
async fn run_query<S: DocumentStore>(
    store: &S,
    spec: &QuerySpec,
    config: &SearchConfig,
) -> Result<Vec<RawCandidate>, SearchError> {
    let timeout = config.request_timeout();
    tracing::debug!(strategy = %spec.strategy, target = ?spec.target, "dispatching query");

    let hits = config
        .retry
        .execute_when(move || attempt(store, spec, timeout), SearchError::is_transient)
        .await?;
    tracing::debug!(strategy = %spec.strategy, hits = hits.len(), "query returned");
    Ok(hits)
}

async fn attempt<S: DocumentStore>(
    store: &S,
    spec: &QuerySpec,
    timeout: Duration,
) -> Result<Vec<RawCandidate>, SearchError> {
    let request = dispatch(store, spec);
    match tokio::time::timeout(timeout, request).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::Timeout(format!(
            "{} query exceeded {}s",
            spec.strategy,
            timeout.as_secs()
        ))),
    }
}

async fn dispatch<S: DocumentStore>(
    store: &S,
    spec: &QuerySpec,
) -> Result<Vec<RawCandidate>, SearchError> {
    match &spec.target {
        QueryTarget::ExternalId(id) => Ok(store.fetch_by_external_id(id).await?.into_iter().collect()),
        _ => store.query(spec).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::types::NumberMatch;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns one hit per query named after its target; fails targets
    /// containing "fail" and stalls targets containing "slow".
    #[derive(Default)]
    struct EchoStore {
        calls: AtomicUsize,
        log: Mutex<Vec<String>>,
    }

    fn label(target: &QueryTarget) -> String {
        match target {
            QueryTarget::Number { value, .. } => format!("num:{value}"),
            QueryTarget::ComplexName(v) => format!("complex:{v}"),
            QueryTarget::Name(v) => format!("name:{v}"),
            QueryTarget::ExternalId(v) => format!("eo:{v}"),
        }
    }

    impl DocumentStore for EchoStore {
        async fn query(&self, spec: &QuerySpec) -> Result<Vec<RawCandidate>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = label(&spec.target);
            self.log.lock().expect("lock").push(name.clone());
            if name.contains("fail") {
                return Err(SearchError::Network("boom".into()));
            }
            if name.contains("misconfigured") {
                return Err(SearchError::Config("bad base url".into()));
            }
            if name.contains("slow") {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            Ok(vec![RawCandidate {
                id: name,
                ..Default::default()
            }])
        }

        async fn fetch_by_external_id(
            &self,
            id: &str,
        ) -> Result<Option<RawCandidate>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().expect("lock").push(format!("eo:{id}"));
            Ok((id != "missing").then(|| RawCandidate {
                id: format!("eo:{id}"),
                eo_number: id.to_owned(),
                ..Default::default()
            }))
        }

        async fn download_artifact(&self, id: &str) -> Result<Vec<u8>, SearchError> {
            Err(SearchError::NotFound(id.to_owned()))
        }
    }

    fn number(strategy: Strategy, value: &str) -> QuerySpec {
        QuerySpec::new(
            strategy,
            QueryTarget::Number {
                value: value.into(),
                mode: NumberMatch::Exact,
            },
        )
    }

    fn config() -> SearchConfig {
        SearchConfig {
            request_delay_ms: 0,
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        }
    }

    fn ids(aggregated: &Aggregated) -> Vec<&str> {
        aggregated.candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[tokio::test]
    async fn hits_concatenated_in_plan_order() {
        let plan = vec![
            number(Strategy::NumberExact, "1"),
            QuerySpec::new(Strategy::TitleKeyword, QueryTarget::Name("word".into())),
            QuerySpec::new(Strategy::KnownDocument, QueryTarget::ExternalId("e1".into())),
        ];
        let store = EchoStore::default();
        let aggregated = aggregate(&store, &plan, &config(), None).await;
        assert_eq!(ids(&aggregated), vec!["num:1", "name:word", "eo:e1"]);
        assert_eq!(aggregated.dispatched, 3);
        assert!(aggregated.failures.is_empty());
    }

    #[tokio::test]
    async fn failed_query_is_excluded_not_fatal() {
        let plan = vec![
            number(Strategy::NumberExact, "fail"),
            number(Strategy::NumberClean, "2"),
        ];
        let store = EchoStore::default();
        let aggregated = aggregate(&store, &plan, &config(), None).await;
        assert_eq!(ids(&aggregated), vec!["num:2"]);
        assert_eq!(aggregated.failures.len(), 1);
        assert_eq!(aggregated.failures[0].strategy, Strategy::NumberExact);
        assert!(!aggregated.all_failed());
    }

    #[tokio::test]
    async fn missing_external_id_yields_no_hit() {
        let plan = vec![QuerySpec::new(
            Strategy::KnownDocument,
            QueryTarget::ExternalId("missing".into()),
        )];
        let aggregated = aggregate(&EchoStore::default(), &plan, &config(), None).await;
        assert!(aggregated.candidates.is_empty());
        assert!(aggregated.failures.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failing_query_retried_per_policy() {
        let plan = vec![number(Strategy::NumberExact, "fail")];
        let store = EchoStore::default();
        let cfg = SearchConfig {
            request_delay_ms: 0,
            ..Default::default()
        };
        let aggregated = aggregate(&store, &plan, &cfg, None).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert!(aggregated.all_failed());
        assert_eq!(aggregated.failures[0].error, "network error: boom");
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_error_is_not_retried() {
        let plan = vec![number(Strategy::NumberExact, "misconfigured")];
        let store = EchoStore::default();
        let cfg = SearchConfig {
            request_delay_ms: 0,
            ..Default::default()
        };
        let started = Instant::now();
        let aggregated = aggregate(&store, &plan, &cfg, None).await;
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(aggregated.all_failed());
        assert_eq!(aggregated.failures[0].error, "config error: bad base url");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_failed_attempt() {
        let plan = vec![number(Strategy::NumberExact, "slow")];
        let store = EchoStore::default();
        let started = Instant::now();
        let aggregated = aggregate(&store, &plan, &config(), None).await;
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(aggregated.failures.len(), 1);
        assert!(aggregated.failures[0].error.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn requests_are_paced() {
        let plan = vec![
            number(Strategy::NumberExact, "1"),
            number(Strategy::NumberClean, "2"),
            number(Strategy::NumberPrefix, "3"),
        ];
        let cfg = SearchConfig {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        };
        let started = Instant::now();
        aggregate(&EchoStore::default(), &plan, &cfg, None).await;
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_skips_untried_queries() {
        let plan = vec![
            number(Strategy::NumberExact, "1"),
            number(Strategy::NumberClean, "2"),
            number(Strategy::NumberPrefix, "3"),
        ];
        let cfg = SearchConfig {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        };
        // The second query would start at 500ms.
        let deadline = Instant::now() + Duration::from_millis(300);
        let aggregated = aggregate(&EchoStore::default(), &plan, &cfg, Some(deadline)).await;
        assert_eq!(ids(&aggregated), vec!["num:1"]);
        assert_eq!(aggregated.skipped, 2);
        assert_eq!(aggregated.dispatched, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_deadline_skips_without_pausing() {
        let plan: Vec<QuerySpec> = (0..9)
            .map(|i| number(Strategy::NumberExact, &i.to_string()))
            .collect();
        let cfg = SearchConfig {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        };
        let store = EchoStore::default();
        let started = Instant::now();
        let aggregated = aggregate(&store, &plan, &cfg, Some(started)).await;
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(aggregated.skipped, 9);
        assert_eq!(aggregated.dispatched, 0);
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_passing_mid_plan_stops_pausing() {
        let plan = vec![
            number(Strategy::NumberExact, "slow"),
            number(Strategy::NumberClean, "2"),
            number(Strategy::NumberPrefix, "3"),
        ];
        let cfg = SearchConfig {
            retry: RetryPolicy::no_retry(),
            ..Default::default()
        };
        let started = Instant::now();
        let deadline = started + Duration::from_secs(1);
        let aggregated = aggregate(&EchoStore::default(), &plan, &cfg, Some(deadline)).await;
        // The first query runs into its 10s timeout; the rest are skipped at once.
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        assert_eq!(aggregated.dispatched, 1);
        assert_eq!(aggregated.skipped, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_strategies_keep_plan_order_and_pace_each_strategy() {
        let plan = vec![
            number(Strategy::NumberExact, "1"),
            QuerySpec::new(Strategy::TitleKeyword, QueryTarget::Name("a".into())),
            QuerySpec::new(Strategy::TitleKeyword, QueryTarget::Name("b".into())),
            QuerySpec::new(Strategy::TitleKeyword, QueryTarget::Name("c".into())),
        ];
        let cfg = SearchConfig {
            retry: RetryPolicy::no_retry(),
            concurrent_strategies: true,
            ..Default::default()
        };
        let started = Instant::now();
        let aggregated = aggregate(&EchoStore::default(), &plan, &cfg, None).await;
        assert_eq!(ids(&aggregated), vec!["num:1", "name:a", "name:b", "name:c"]);
        // Three keyword queries in sequence: two pauses.
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[test]
    fn grouping_preserves_first_appearance() {
        let plan = vec![
            number(Strategy::NumberExact, "1"),
            QuerySpec::new(Strategy::TitleKeyword, QueryTarget::Name("a".into())),
            number(Strategy::NumberClean, "1"),
            QuerySpec::new(Strategy::TitleKeyword, QueryTarget::Name("b".into())),
        ];
        assert_eq!(group_by_strategy(&plan), vec![vec![0], vec![1, 3], vec![2]]);
    }
}
