//! Weighted relevance scoring of registry candidates.
//!
//! Assigns an integer score from independent contributions:
//! - Number match tier (exact, cleaned, partial, contained)
//! - Title words found in the candidate's name or compound name
//! - Recency bonus from the candidate's publication date
//!
//! Amending documents are capped rather than penalised, and anything below
//! the minimum threshold is dropped.

use std::fmt;

use serde::Serialize;

use crate::normalize::{clean_number, is_amendment, significant_words};
use crate::tables::{scoring_weights, ScoringWeights};
use crate::types::{DocumentDescriptor, RawCandidate, ScoredCandidate};

/// Title words must be longer than this to count.
const TITLE_WORD_MIN_CHARS: usize = 3;

/// At most this many title words are compared.
const MAX_TITLE_WORDS: usize = 5;

/// How a candidate's number relates to the queried number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberTier {
    Exact,
    Clean,
    /// Cleaned query covers more than half of the candidate number.
    PartialLong,
    PartialShort,
    /// Candidate number sits inside the cleaned query.
    Contained,
    None,
}

/// Every contribution to a candidate's score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub number_tier: NumberTier,
    pub number_points: i64,
    pub title_matches: usize,
    pub title_points: i64,
    pub year_bonus: i64,
    pub is_amendment: bool,
    /// Final score, after the amendment cap.
    pub total: i64,
}

impl fmt::Display for ScoreBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "total score: {}", self.total)?;
        let number = match self.number_tier {
            NumberTier::Exact => Some("exact number match"),
            NumberTier::Clean => Some("cleaned number match"),
            NumberTier::PartialLong | NumberTier::PartialShort => Some("partial number match"),
            NumberTier::Contained => Some("number contained in query"),
            NumberTier::None => None,
        };
        if let Some(label) = number {
            writeln!(f, "+ {label} (+{})", self.number_points)?;
        }
        if self.title_matches > 0 {
            writeln!(
                f,
                "+ title match, {} words (+{})",
                self.title_matches, self.title_points
            )?;
        }
        if self.year_bonus > 0 {
            writeln!(f, "+ recency bonus (+{})", self.year_bonus)?;
        }
        if self.is_amendment {
            writeln!(f, "! amending document, score capped")?;
        }
        Ok(())
    }
}

/// Scores candidates against a descriptor using a fixed weight table.
#[derive(Debug, Clone, Copy)]
pub struct RelevanceScorer<'w> {
    weights: &'w ScoringWeights,
}

impl Default for RelevanceScorer<'static> {
    fn default() -> Self {
        Self::new(scoring_weights())
    }
}

/// Per-descriptor values reused across candidates.
struct Query<'d> {
    raw_number: &'d str,
    clean_number: String,
    title_words: Vec<String>,
}

impl<'d> Query<'d> {
    fn new(descriptor: &'d DocumentDescriptor) -> Self {
        Self {
            raw_number: &descriptor.number,
            clean_number: clean_number(&descriptor.number).to_lowercase(),
            title_words: significant_words(
                descriptor.title_or_empty(),
                TITLE_WORD_MIN_CHARS,
                MAX_TITLE_WORDS,
            ),
        }
    }
}

impl<'w> RelevanceScorer<'w> {
    pub fn new(weights: &'w ScoringWeights) -> Self {
        Self { weights }
    }

    /// Full breakdown of how `candidate` scores against `descriptor`.
    pub fn breakdown(
        &self,
        descriptor: &DocumentDescriptor,
        candidate: &RawCandidate,
    ) -> ScoreBreakdown {
        self.breakdown_for(&Query::new(descriptor), candidate)
    }

    /// Score one candidate; `None` when it falls below the threshold.
    pub fn score(
        &self,
        descriptor: &DocumentDescriptor,
        candidate: RawCandidate,
    ) -> Option<ScoredCandidate> {
        self.score_for(&Query::new(descriptor), candidate)
    }

    /// Score every candidate, dropping those below the threshold and
    /// keeping discovery order.
    pub fn score_all(
        &self,
        descriptor: &DocumentDescriptor,
        candidates: Vec<RawCandidate>,
    ) -> Vec<ScoredCandidate> {
        let query = Query::new(descriptor);
        candidates
            .into_iter()
            .filter_map(|c| self.score_for(&query, c))
            .collect()
    }

    fn score_for(&self, query: &Query<'_>, candidate: RawCandidate) -> Option<ScoredCandidate> {
        let breakdown = self.breakdown_for(query, &candidate);
        if breakdown.total < self.weights.min_score_threshold {
            tracing::trace!(id = %candidate.id, score = breakdown.total, "candidate below threshold");
            return None;
        }
        Some(ScoredCandidate {
            candidate,
            score: breakdown.total,
            is_amendment: breakdown.is_amendment,
        })
    }

    fn breakdown_for(&self, query: &Query<'_>, candidate: &RawCandidate) -> ScoreBreakdown {
        let (number_tier, number_points) = self.number_match(query, &candidate.number);
        let title_matches = title_matches(&query.title_words, candidate);
        let title_points = self.title_points(title_matches);
        let year_bonus = self.year_bonus(&candidate.view_date);
        let amendment = is_amendment(&candidate.complex_name);

        let mut total = number_points + title_points + year_bonus;
        if amendment {
            total = total.min(self.weights.amendment_cap);
        }

        ScoreBreakdown {
            number_tier,
            number_points,
            title_matches,
            title_points,
            year_bonus,
            is_amendment: amendment,
            total,
        }
    }

    fn number_match(&self, query: &Query<'_>, candidate_number: &str) -> (NumberTier, i64) {
        let w = self.weights;
        if candidate_number.trim().is_empty() {
            return (NumberTier::None, 0);
        }
        if candidate_number == query.raw_number {
            return (NumberTier::Exact, w.exact_number);
        }

        let candidate_clean = clean_number(candidate_number).to_lowercase();
        if candidate_clean.is_empty() || query.clean_number.is_empty() {
            return (NumberTier::None, 0);
        }
        if candidate_clean == query.clean_number {
            return (NumberTier::Clean, w.clean_number);
        }
        if candidate_clean.contains(&query.clean_number) {
            let ratio = query.clean_number.chars().count() as f64
                / candidate_clean.chars().count() as f64;
            return if ratio > 0.5 {
                (NumberTier::PartialLong, w.partial_number_long)
            } else {
                (NumberTier::PartialShort, w.partial_number_short)
            };
        }
        if query.clean_number.contains(&candidate_clean) {
            return (NumberTier::Contained, w.contained_number);
        }
        (NumberTier::None, 0)
    }

    fn title_points(&self, matches: usize) -> i64 {
        match matches {
            0 => 0,
            1 => self.weights.title_one_word,
            2 => self.weights.title_two_words,
            _ => self.weights.title_three_words,
        }
    }

    fn year_bonus(&self, view_date: &str) -> i64 {
        self.weights
            .year_bonuses
            .iter()
            .find(|(year, _)| view_date.contains(year.as_str()))
            .map_or(0, |(_, bonus)| *bonus)
    }
}

/// Query words found in the name or in the compound name, whichever has
/// more.
fn title_matches(words: &[String], candidate: &RawCandidate) -> usize {
    if words.is_empty() {
        return 0;
    }
    let name = candidate.name.to_lowercase();
    let complex = candidate.complex_name.to_lowercase();
    let in_name = words.iter().filter(|w| name.contains(w.as_str())).count();
    let in_complex = words.iter().filter(|w| complex.contains(w.as_str())).count();
    in_name.max(in_complex)
}
