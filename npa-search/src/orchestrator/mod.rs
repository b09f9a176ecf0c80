//! Search orchestrator: query planning, aggregation, scoring, dedup, ranking.
//!
//! This module turns a document descriptor into strategy queries, runs them
//! against a [`crate::store::DocumentStore`], scores and deduplicates the
//! candidates, and returns a sorted, truncated result set.

pub mod aggregate;
pub mod consolidated;
pub mod dedup;
pub mod planner;
pub mod scoring;
pub mod search;
