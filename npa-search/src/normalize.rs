//! Document-number canonicalisation and amendment detection.

use crate::tables::amendment_keywords;

/// Strip number markers and whitespace from a document number.
///
/// Removes every `№`, `N` and whitespace character, then leading hyphens,
/// then trims. The result is stable under repeated application.
///
/// ```
/// use npa_search::normalize::clean_number;
///
/// assert_eq!(clean_number("№ 273-ФЗ"), "273-ФЗ");
/// assert_eq!(clean_number("N 1490"), "1490");
/// ```
pub fn clean_number(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| *c != '№' && *c != 'N' && !c.is_whitespace())
        .collect();
    stripped.trim_start_matches('-').trim().to_owned()
}

/// Whether `title` reads as a document that amends, repeals, suspends or
/// extends another one, using the built-in keyword table.
pub fn is_amendment(title: &str) -> bool {
    is_amendment_with(title, amendment_keywords())
}

/// [`is_amendment`] with a caller-supplied keyword list.
///
/// Keywords are expected in lower case.
pub fn is_amendment_with<S: AsRef<str>>(title: &str, keywords: &[S]) -> bool {
    if title.trim().is_empty() {
        return false;
    }
    let lower = title.to_lowercase();
    keywords.iter().any(|k| lower.contains(k.as_ref()))
}

/// Lower-cased words of `text` longer than `min_chars`, stripped of
/// surrounding punctuation, at most `limit` of them.
pub(crate) fn significant_words(text: &str, min_chars: usize, limit: usize) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.chars().count() > min_chars)
        .take(limit)
        .collect()
}
