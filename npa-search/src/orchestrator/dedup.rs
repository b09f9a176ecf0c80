//! Candidate deduplication by identity key.
//!
//! The same document often comes back from several strategies, sometimes
//! as differently shaped records. A candidate is a duplicate when any of
//! its identity keys (external id, registry id, number plus name prefix)
//! was already registered by a kept candidate.

use std::collections::HashMap;

use crate::types::{RawCandidate, ScoredCandidate};

/// Characters of the lower-cased name that go into the number+name key.
const NAME_PREFIX_CHARS: usize = 50;

/// The non-empty identity keys of `candidate`.
///
/// Keys are namespaced so an id can never collide with an external id.
pub fn identity_keys(candidate: &RawCandidate) -> Vec<String> {
    let mut keys = Vec::with_capacity(3);
    if !candidate.eo_number.trim().is_empty() {
        keys.push(format!("eo:{}", candidate.eo_number.trim()));
    }
    if !candidate.id.trim().is_empty() {
        keys.push(format!("id:{}", candidate.id.trim()));
    }
    if !candidate.number.trim().is_empty() {
        let prefix: String = candidate
            .name
            .to_lowercase()
            .chars()
            .take(NAME_PREFIX_CHARS)
            .collect();
        keys.push(format!("nn:{}|{}", candidate.number.trim(), prefix));
    }
    keys
}

/// Collapse duplicates, preserving discovery order.
///
/// On a collision the record with the longer `name` occupies the slot of
/// the first one; the other is discarded. Candidates without any key are
/// always kept.
pub fn deduplicate(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut kept: Vec<ScoredCandidate> = Vec::with_capacity(candidates.len());
    // Identity key -> slot in `kept`.
    let mut seen: HashMap<String, usize> = HashMap::new();

    for scored in candidates {
        let keys = identity_keys(&scored.candidate);
        let existing = keys.iter().find_map(|k| seen.get(k).copied());

        match existing {
            None => {
                let slot = kept.len();
                for key in keys {
                    seen.insert(key, slot);
                }
                kept.push(scored);
            }
            Some(slot) => {
                let incumbent = &kept[slot];
                if name_len(&scored) > name_len(incumbent) {
                    tracing::trace!(
                        replaced = %incumbent.candidate.id,
                        by = %scored.candidate.id,
                        "duplicate with more complete record"
                    );
                    for key in keys {
                        seen.entry(key).or_insert(slot);
                    }
                    kept[slot] = scored;
                } else {
                    tracing::trace!(id = %scored.candidate.id, "duplicate discarded");
                }
            }
        }
    }

    kept
}

fn name_len(scored: &ScoredCandidate) -> usize {
    scored.candidate.name.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, number: &str, eo: &str, name: &str, score: i64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: RawCandidate {
                id: id.into(),
                number: number.into(),
                eo_number: eo.into(),
                name: name.into(),
                ..Default::default()
            },
            score,
            is_amendment: false,
        }
    }

    fn ids(results: &[ScoredCandidate]) -> Vec<&str> {
        results.iter().map(|r| r.candidate.id.as_str()).collect()
    }

    #[test]
    fn distinct_candidates_all_kept_in_order() {
        let input = vec![
            scored("1", "273-ФЗ", "e1", "A", 8000),
            scored("2", "44-ФЗ", "e2", "B", 7000),
            scored("3", "223-ФЗ", "e3", "C", 6000),
        ];
        assert_eq!(ids(&deduplicate(input)), vec!["1", "2", "3"]);
    }

    #[test]
    fn shared_external_id_keeps_longer_name() {
        let input = vec![
            scored("1", "273-ФЗ", "0001201212300007", "Закон", 8000),
            scored("2", "273", "0001201212300007", "Федеральный закон об образовании", 4000),
        ];
        let result = deduplicate(input);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].candidate.id, "2");
        assert_eq!(result[0].score, 4000);
    }

    #[test]
    fn replacement_happens_in_place() {
        let input = vec![
            scored("a", "1", "x", "short", 100),
            scored("b", "2", "y", "other", 100),
            scored("c", "3", "x", "much longer name", 100),
        ];
        assert_eq!(ids(&deduplicate(input)), vec!["c", "b"]);
    }

    #[test]
    fn shorter_or_equal_name_is_discarded() {
        let input = vec![
            scored("1", "273-ФЗ", "", "Same name", 8000),
            scored("1", "273", "", "Same name", 4000),
        ];
        let result = deduplicate(input);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].score, 8000);
    }

    #[test]
    fn number_and_name_prefix_collide_case_insensitively() {
        let input = vec![
            scored("1", "709н", "", "Об утверждении порядка", 7000),
            scored("2", "709н", "", "ОБ УТВЕРЖДЕНИИ ПОРЯДКА", 7000),
        ];
        assert_eq!(deduplicate(input).len(), 1);
    }

    #[test]
    fn replacement_registers_new_keys() {
        let input = vec![
            scored("1", "", "e1", "a", 100),
            scored("2", "", "e1", "longer", 100),
            // Collides only with the replacement's id.
            scored("2", "", "", "", 100),
        ];
        let result = deduplicate(input);
        assert_eq!(ids(&result), vec!["2"]);
    }

    #[test]
    fn keyless_candidates_are_kept() {
        let input = vec![scored("", "", "", "x", 1), scored("", "", "", "x", 1)];
        assert_eq!(deduplicate(input).len(), 2);
    }

    #[test]
    fn identity_keys_skip_empty_fields() {
        let c = RawCandidate {
            id: "42".into(),
            ..Default::default()
        };
        assert_eq!(identity_keys(&c), vec!["id:42".to_owned()]);
    }
}
