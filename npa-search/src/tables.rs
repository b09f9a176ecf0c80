//! Static reference tables: scoring weights, amendment vocabulary and
//! well-known documents.
//!
//! Every table is built once on first access and shared read-only for the
//! rest of the process.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Weights used by [`crate::orchestrator::scoring::RelevanceScorer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Candidate number equals the query number as written.
    pub exact_number: i64,
    /// Cleaned numbers are equal.
    pub clean_number: i64,
    /// Cleaned query number is a substring covering more than half of the
    /// candidate number.
    pub partial_number_long: i64,
    /// Cleaned query number is a substring covering half or less.
    pub partial_number_short: i64,
    /// Candidate number is a substring of the cleaned query number.
    pub contained_number: i64,
    pub title_three_words: i64,
    pub title_two_words: i64,
    pub title_one_word: i64,
    /// Ceiling applied to amending documents.
    pub amendment_cap: i64,
    /// Candidates scoring below this are dropped.
    pub min_score_threshold: i64,
    /// `(year, bonus)` pairs, checked in order; newest first.
    pub year_bonuses: Vec<(String, i64)>,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_number: 8000,
            clean_number: 7000,
            partial_number_long: 6000,
            partial_number_short: 3000,
            contained_number: 4000,
            title_three_words: 3000,
            title_two_words: 1500,
            title_one_word: 500,
            amendment_cap: 1000,
            min_score_threshold: 500,
            year_bonuses: vec![
                ("2024".into(), 250),
                ("2023".into(), 200),
                ("2022".into(), 150),
                ("2021".into(), 100),
                ("2020".into(), 50),
            ],
        }
    }
}

/// A well-known document with extra search hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownDocument {
    /// Registry `eoNumber`s to fetch directly.
    pub eo_hints: Vec<&'static str>,
    pub description: &'static str,
}

/// A document whose in-force text is hosted by the official legal
/// information system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialConsolidated {
    /// Identifier of the document in the legal information system.
    pub system_id: &'static str,
    pub full_name: &'static str,
    pub year: &'static str,
}

static SCORING_WEIGHTS: OnceLock<ScoringWeights> = OnceLock::new();
static AMENDMENT_KEYWORDS: OnceLock<Vec<&'static str>> = OnceLock::new();
static KNOWN_DOCUMENTS: OnceLock<HashMap<&'static str, KnownDocument>> = OnceLock::new();
static OFFICIAL_CONSOLIDATED: OnceLock<HashMap<&'static str, OfficialConsolidated>> =
    OnceLock::new();
static BACKUP_PROVIDER_URLS: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

/// Process-wide default scoring weights.
pub fn scoring_weights() -> &'static ScoringWeights {
    SCORING_WEIGHTS.get_or_init(ScoringWeights::default)
}

/// Lower-case stems that mark a document as amending another one.
pub fn amendment_keywords() -> &'static [&'static str] {
    AMENDMENT_KEYWORDS.get_or_init(|| {
        vec![
            "изменени",
            "дополнени",
            "внесени",
            "признании утратившим",
            "о внесении",
            "изменения в",
            "дополнения в",
            "о признании",
            "утратившим силу",
            "изменить",
            "дополнить",
            "отменить",
            "приостановить действие",
            "продлить действие",
        ]
    })
}

/// Look up a well-known document by cleaned number (case-insensitive).
pub fn known_document(clean_number: &str) -> Option<&'static KnownDocument> {
    let table = KNOWN_DOCUMENTS.get_or_init(|| {
        HashMap::from([
            (
                "1490",
                KnownDocument {
                    eo_hints: vec!["0001202009250006"],
                    description: "О лицензировании образовательной деятельности",
                },
            ),
            (
                "825",
                KnownDocument {
                    eo_hints: vec![],
                    description: "О федеральной информационной системе ФРДО",
                },
            ),
            (
                "580",
                KnownDocument {
                    eo_hints: vec!["0001202304110042"],
                    description: "О разработке и утверждении профессиональных стандартов",
                },
            ),
            (
                "719",
                KnownDocument {
                    eo_hints: vec![],
                    description: "О государственной информационной системе",
                },
            ),
            (
                "273-фз",
                KnownDocument {
                    eo_hints: vec!["0001201212300007"],
                    description: "Об образовании в Российской Федерации",
                },
            ),
        ])
    });
    table.get(clean_number.to_lowercase().as_str())
}

/// Look up a document hosted in the official legal information system.
pub fn official_consolidated(clean_number: &str) -> Option<&'static OfficialConsolidated> {
    let table = OFFICIAL_CONSOLIDATED.get_or_init(|| {
        HashMap::from([
            (
                "273-фз",
                OfficialConsolidated {
                    system_id: "70291362",
                    full_name: "Федеральный закон \"Об образовании в Российской Федерации\"",
                    year: "2012",
                },
            ),
            (
                "44-фз",
                OfficialConsolidated {
                    system_id: "70353464",
                    full_name: "Федеральный закон \"О контрактной системе\"",
                    year: "2013",
                },
            ),
            (
                "223-фз",
                OfficialConsolidated {
                    system_id: "12177967",
                    full_name: "Федеральный закон \"О закупках товаров, работ, услуг\"",
                    year: "2011",
                },
            ),
        ])
    });
    table.get(clean_number.to_lowercase().as_str())
}

/// Look up a consolidated-text URL at the backup legal-reference provider.
///
/// The federal-law suffix is optional: `273` and `273-ФЗ` resolve alike.
pub fn backup_provider_url(clean_number: &str) -> Option<&'static str> {
    let table = BACKUP_PROVIDER_URLS.get_or_init(|| {
        HashMap::from([
            ("273-фз", "http://base.garant.ru/70291362/"),
            ("44-фз", "http://base.garant.ru/70353464/"),
            ("223-фз", "http://base.garant.ru/12177967/"),
        ])
    });
    let lower = clean_number.trim().to_lowercase();
    let key = format!("{}-фз", lower.trim_end_matches("-фз").trim());
    table.get(key.as_str()).copied()
}
