//! Resolution of a found document to its consolidated (in-force) text.
//!
//! The registry API only serves documents as originally published. The
//! amended-in-place text lives in the official legal information system or
//! at a backup legal-reference provider. Resolution tries a fixed list of
//! static sources in order and, when none knows the document, degrades to
//! instructions for a manual search. It never fails.

use serde::{Deserialize, Serialize};

use crate::normalize::clean_number;
use crate::tables::{backup_provider_url, official_consolidated};
use crate::types::RawCandidate;

/// Search page of the official legal information system.
pub const OFFICIAL_SYSTEM_URL: &str = "http://pravo.gov.ru/ips/";

/// Download URL prefix for as-published PDFs, keyed by `eoNumber`.
pub const PUBLICATION_PDF_URL: &str = "http://publication.pravo.gov.ru/file/pdf?eoNumber=";

/// Where a consolidated text was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolidatedSource {
    OfficialSystem,
    BackupProvider,
}

/// Link to the as-published PDF of a registry document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLink {
    pub eo_number: String,
    pub pdf_url: String,
    pub note: String,
}

/// A resolved consolidated version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedInfo {
    pub source: ConsolidatedSource,
    pub url: String,
    pub title: String,
    /// Identifier of the document at the source, when known.
    pub document_id: Option<String>,
    pub search_term: String,
    /// The registry's original-version PDF, when the candidate has an
    /// `eoNumber`.
    pub original: Option<ArtifactLink>,
}

/// An external site where the user can search by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupSource {
    pub name: String,
    pub url: String,
    pub search_term: String,
}

/// Human-actionable steps for locating a consolidated text manually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualSearchInstructions {
    pub instructions: Vec<String>,
    pub search_terms: Vec<String>,
    pub backup_sources: Vec<BackupSource>,
    pub api_fallback: Option<ArtifactLink>,
}

/// Outcome of [`find_consolidated_version`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConsolidatedLookup {
    #[serde(rename = "consolidated_version")]
    Found(ConsolidatedInfo),
    #[serde(rename = "manual_search_required")]
    ManualSearch(ManualSearchInstructions),
}

impl ConsolidatedLookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

type Resolver = fn(&RawCandidate, &str) -> Option<ConsolidatedInfo>;

/// Resolvers in the order they are tried.
const RESOLVERS: &[(&str, Resolver)] = &[
    ("official-system", resolve_official),
    ("backup-provider", resolve_backup),
];

/// Resolve `candidate` to its consolidated version, or to manual search
/// instructions when no static source knows it.
pub fn find_consolidated_version(candidate: &RawCandidate) -> ConsolidatedLookup {
    let clean = clean_number(&candidate.number);
    for (name, resolve) in RESOLVERS {
        if let Some(info) = resolve(candidate, &clean) {
            tracing::debug!(number = %clean, source = name, "consolidated version resolved");
            return ConsolidatedLookup::Found(info);
        }
    }
    tracing::info!(number = %clean, "no consolidated source known, manual search required");
    ConsolidatedLookup::ManualSearch(manual_search(candidate))
}

fn resolve_official(candidate: &RawCandidate, clean: &str) -> Option<ConsolidatedInfo> {
    let known = official_consolidated(clean)?;
    Some(ConsolidatedInfo {
        source: ConsolidatedSource::OfficialSystem,
        url: OFFICIAL_SYSTEM_URL.to_owned(),
        title: format!("{} ({})", known.full_name, known.year),
        document_id: Some(known.system_id.to_owned()),
        search_term: candidate.number.clone(),
        original: original_pdf(candidate, "original version without amendments"),
    })
}

fn resolve_backup(candidate: &RawCandidate, clean: &str) -> Option<ConsolidatedInfo> {
    let url = backup_provider_url(clean)?;
    Some(ConsolidatedInfo {
        source: ConsolidatedSource::BackupProvider,
        url: url.to_owned(),
        title: format!("Consolidated version of {}", candidate.number),
        document_id: None,
        search_term: candidate.number.clone(),
        original: original_pdf(candidate, "original version without amendments"),
    })
}

fn original_pdf(candidate: &RawCandidate, note: &str) -> Option<ArtifactLink> {
    let eo = candidate.eo_number.trim();
    if eo.is_empty() {
        return None;
    }
    Some(ArtifactLink {
        eo_number: eo.to_owned(),
        pdf_url: format!("{PUBLICATION_PDF_URL}{eo}"),
        note: note.to_owned(),
    })
}

fn manual_search(candidate: &RawCandidate) -> ManualSearchInstructions {
    let number = candidate.number.trim();
    let name_prefix: String = candidate.name.chars().take(50).collect();

    let mut instructions = vec![
        format!("1. Open the official legal information system: {OFFICIAL_SYSTEM_URL}"),
        format!("2. Search for the number: {number}"),
    ];
    if !name_prefix.is_empty() {
        instructions.push(format!("3. Or search for the title: {name_prefix}"));
    }
    instructions.push(format!(
        "{}. Open the current revision and download its PDF",
        instructions.len() + 1
    ));

    let search_terms = [number, candidate.name.trim()]
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect();

    let backup_sources = [
        ("КонсультантПлюс", "http://www.consultant.ru/"),
        ("Гарант", "http://www.garant.ru/"),
    ]
    .into_iter()
    .map(|(name, url)| BackupSource {
        name: name.to_owned(),
        url: url.to_owned(),
        search_term: number.to_owned(),
    })
    .collect();

    ManualSearchInstructions {
        instructions,
        search_terms,
        backup_sources,
        api_fallback: original_pdf(candidate, "fallback: original version from the registry"),
    }
}
