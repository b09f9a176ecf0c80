//! Query planning: one descriptor in, an ordered list of strategy-tagged
//! queries out.
//!
//! Every strategy is always planned; none short-circuits another.

use crate::normalize::{clean_number, significant_words};
use crate::tables::known_document;
use crate::types::{DocumentDescriptor, NumberMatch, QuerySpec, QueryTarget, Strategy};

/// Title words must be longer than this to become keyword queries.
const KEYWORD_MIN_CHARS: usize = 4;

/// At most this many keyword queries per title.
const MAX_KEYWORD_QUERIES: usize = 3;

/// Build the ordered query plan for `descriptor`.
///
/// # Order
///
/// 1. number as written, exact
/// 2. cleaned number, exact
/// 3. cleaned number, starts-with
/// 4. cleaned number against the compound name
/// 5. up to three title words longer than four characters, one query each
/// 6. one external-id lookup per hint of a well-known document
pub fn plan_queries(descriptor: &DocumentDescriptor) -> Vec<QuerySpec> {
    let clean = clean_number(&descriptor.number);

    let mut plan = vec![
        QuerySpec::new(
            Strategy::NumberExact,
            QueryTarget::Number {
                value: descriptor.number.clone(),
                mode: NumberMatch::Exact,
            },
        ),
        QuerySpec::new(
            Strategy::NumberClean,
            QueryTarget::Number {
                value: clean.clone(),
                mode: NumberMatch::Exact,
            },
        ),
        QuerySpec::new(
            Strategy::NumberPrefix,
            QueryTarget::Number {
                value: clean.clone(),
                mode: NumberMatch::StartsWith,
            },
        ),
        QuerySpec::new(Strategy::CompositeName, QueryTarget::ComplexName(clean.clone())),
    ];

    plan.extend(
        significant_words(descriptor.title_or_empty(), KEYWORD_MIN_CHARS, MAX_KEYWORD_QUERIES)
            .into_iter()
            .map(|word| QuerySpec::new(Strategy::TitleKeyword, QueryTarget::Name(word))),
    );

    if let Some(known) = known_document(&clean) {
        tracing::debug!(number = %clean, description = known.description, "known document");
        plan.extend(known.eo_hints.iter().map(|eo| {
            QuerySpec::new(Strategy::KnownDocument, QueryTarget::ExternalId((*eo).to_owned()))
        }));
    }

    plan
}
