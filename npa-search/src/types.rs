//! Core types: descriptors, store hits, scored candidates and query specs.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::SearchError;
use crate::normalize::clean_number;

/// The caller's query for a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    /// Document type as written by the caller, e.g. `ФЗ` or `Постановление`.
    #[serde(rename = "type", default)]
    pub doc_type: String,
    /// Document number in any loose form, e.g. `№ 273-ФЗ`.
    #[serde(default)]
    pub number: String,
    /// Document title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl DocumentDescriptor {
    /// Create a descriptor without a title.
    pub fn new(doc_type: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            number: number.into(),
            title: None,
        }
    }

    /// Attach a title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The title, or an empty string.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Checks that `type` and `number` are present and that the number
    /// cleans to more than one character.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.doc_type.trim().is_empty() {
            return Err(SearchError::InvalidDescriptor(
                "field type must not be empty".into(),
            ));
        }
        if self.number.trim().is_empty() {
            return Err(SearchError::InvalidDescriptor(
                "field number must not be empty".into(),
            ));
        }
        if clean_number(&self.number).chars().count() <= 1 {
            return Err(SearchError::InvalidDescriptor(format!(
                "document number is too short: {}",
                self.number
            )));
        }
        Ok(())
    }
}

/// An unranked hit returned by a document store.
///
/// Field names follow the registry's JSON. Unknown fields are kept in
/// [`RawCandidate::extra`] and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub complex_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub eo_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub view_date: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The registry sends `null` for absent text fields; treat it as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A candidate that survived scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: RawCandidate,
    /// Relevance score; never below the minimum threshold.
    pub score: i64,
    /// Whether the compound name reads as an amending document.
    pub is_amendment: bool,
}

/// Ranked search output: descending by score, at most `max_results` long.
pub type RankedResults = Vec<ScoredCandidate>;

/// Named search strategies, in the order they are planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// The number exactly as the caller wrote it.
    NumberExact,
    /// The cleaned number.
    NumberClean,
    /// The cleaned number as a starts-with search.
    NumberPrefix,
    /// The cleaned number against the compound-name field.
    CompositeName,
    /// A significant word from the title against the name field.
    TitleKeyword,
    /// An external reference id from the known-document table.
    KnownDocument,
}

impl Strategy {
    /// Returns the stable name used in logs and error reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NumberExact => "number-exact",
            Self::NumberClean => "number-clean",
            Self::NumberPrefix => "number-prefix",
            Self::CompositeName => "composite-name",
            Self::TitleKeyword => "title-keyword",
            Self::KnownDocument => "known-document",
        }
    }

    /// Returns all strategies in planning order.
    pub fn all() -> &'static [Strategy] {
        &[
            Self::NumberExact,
            Self::NumberClean,
            Self::NumberPrefix,
            Self::CompositeName,
            Self::TitleKeyword,
            Self::KnownDocument,
        ]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a number search matches the registry's number field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberMatch {
    Exact,
    StartsWith,
}

/// What a single query asks the store for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "kebab-case")]
pub enum QueryTarget {
    /// Search the number field.
    Number { value: String, mode: NumberMatch },
    /// Search the compound-name field.
    ComplexName(String),
    /// Search the name field.
    Name(String),
    /// Look a record up by its external reference id (`eoNumber`).
    ExternalId(String),
}

/// One planned query, tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub strategy: Strategy,
    pub target: QueryTarget,
}

impl QuerySpec {
    pub fn new(strategy: Strategy, target: QueryTarget) -> Self {
        Self { strategy, target }
    }
}

/// A document mention produced by a [`crate::extract::TextExtractor`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocumentMention {
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub title: String,
    /// `НПА` for normative acts, `ПИСЬМО` for letters.
    #[serde(default)]
    pub category: String,
}

impl RawDocumentMention {
    /// Convert to a search descriptor. The title is dropped when blank.
    pub fn to_descriptor(&self) -> DocumentDescriptor {
        let title = self.title.trim();
        DocumentDescriptor {
            doc_type: self.doc_type.clone(),
            number: self.number.clone(),
            title: (!title.is_empty()).then(|| title.to_owned()),
        }
    }
}
