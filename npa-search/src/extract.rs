//! Document mentions from free text.
//!
//! A [`TextExtractor`] turns a chunk of prose into raw document mentions.
//! This module splits long text into overlapping chunks, runs the extractor
//! over each one, drops junk, merges duplicates and separates letters from
//! normative acts.

use std::collections::HashMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::config::{SearchConfig, CHUNK_BREAK_WINDOW};
use crate::error::SearchError;
use crate::types::RawDocumentMention;

/// Placeholder numbers extractors emit for "no number".
const JUNK_NUMBERS: &[&str] = &["nan", "none", "нет", "н/а"];

/// Longest plausible document number.
const MAX_NUMBER_CHARS: usize = 30;

/// Shortest plausible title.
const MIN_TITLE_CHARS: usize = 5;

/// Break points in order of preference.
const BREAK_PATTERNS: &[&str] = &["\n\n", "\n", ". ", " "];

/// A source of document mentions, typically backed by a language model.
pub trait TextExtractor: Send + Sync {
    /// Extract every document mentioned in `chunk`.
    fn extract(
        &self,
        chunk: &str,
    ) -> impl Future<Output = Result<Vec<RawDocumentMention>, SearchError>> + Send;
}

/// Mentions found in a text, deduplicated and split by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMentions {
    /// Every unique mention, in discovery order.
    pub all: Vec<RawDocumentMention>,
    /// Normative acts (laws, decrees, orders).
    pub acts: Vec<RawDocumentMention>,
    /// Letters and other correspondence.
    pub letters: Vec<RawDocumentMention>,
    /// Chunks the extractor failed on after retries.
    pub failed_chunks: usize,
}

/// Split `text` into chunks of at most `max_chars` characters that overlap
/// by `overlap` characters.
///
/// Each chunk ends at the best break point within the last
/// [`CHUNK_BREAK_WINDOW`] characters: a blank line, then a newline, then a
/// sentence end, then a space. Without one the chunk is cut at `max_chars`.
pub fn split_text(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return vec![text.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = start + max_chars;
        if end >= chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        let window = &chars[start..end];
        let min_break = max_chars.saturating_sub(CHUNK_BREAK_WINDOW);
        let best_break = BREAK_PATTERNS
            .iter()
            .filter_map(|pattern| rfind_chars(window, pattern))
            .find(|&pos| pos > min_break);

        let chunk_end = match best_break {
            Some(pos) => start + pos + 1,
            None => end,
        };
        chunks.push(chars[start..chunk_end].iter().collect());

        let next = chunk_end.saturating_sub(overlap);
        // Always make progress, even with a degenerate overlap.
        start = if next > start { next } else { chunk_end };
    }
    chunks
}

/// Index of the last occurrence of `pattern` in `haystack`.
fn rfind_chars(haystack: &[char], pattern: &str) -> Option<usize> {
    let needle: Vec<char> = pattern.chars().collect();
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == needle[..])
}

/// Whether a mention looks like a real document reference.
pub fn is_valid_mention(mention: &RawDocumentMention) -> bool {
    let number = mention.number.trim();
    let title = mention.title.trim().to_lowercase();

    !(number.is_empty()
        || JUNK_NUMBERS.contains(&number.to_lowercase().as_str())
        || number.chars().count() > MAX_NUMBER_CHARS
        || title.contains("http")
        || title.contains("www")
        || title.contains('@')
        || title.chars().count() < MIN_TITLE_CHARS)
}

/// Identity of a mention: lower-cased type plus the number without markers,
/// separators or whitespace.
fn mention_key(mention: &RawDocumentMention) -> String {
    let doc_type = mention.doc_type.trim().to_lowercase();
    let number: String = mention
        .number
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '№' | 'n' | '°' | '#' | '-' | '_') && !c.is_whitespace())
        .collect();
    format!("{doc_type}_{number}")
}

/// Collapse mentions with the same identity, keeping the one with the
/// longer title in the first one's position.
pub fn dedup_mentions(mentions: Vec<RawDocumentMention>) -> Vec<RawDocumentMention> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<RawDocumentMention> = Vec::new();

    for mention in mentions {
        let key = mention_key(&mention);
        match index.get(&key) {
            Some(&slot) => {
                if mention.title.chars().count() > unique[slot].title.chars().count() {
                    unique[slot] = mention;
                }
            }
            None => {
                index.insert(key, unique.len());
                unique.push(mention);
            }
        }
    }
    unique
}

/// Whether a mention refers to a letter rather than a normative act.
pub fn is_letter(mention: &RawDocumentMention) -> bool {
    mention.doc_type.to_lowercase().contains("письмо") || mention.category == "ПИСЬМО"
}

/// Run `extractor` over `text` and collect clean, unique mentions.
///
/// Each chunk call is retried per `config.retry` and consecutive calls are
/// paced by `config.request_delay_ms`. A chunk that still fails is logged
/// and skipped.
pub async fn extract_mentions<X: TextExtractor>(
    extractor: &X,
    text: &str,
    config: &SearchConfig,
) -> ExtractedMentions {
    let chunks = split_text(text, config.chunk_size, config.chunk_overlap);
    tracing::debug!(chunks = chunks.len(), chars = text.chars().count(), "extracting mentions");

    let mut raw = Vec::new();
    let mut failed_chunks = 0;
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 && config.request_delay_ms > 0 {
            tokio::time::sleep(config.request_delay()).await;
        }
        let chunk = chunk.as_str();
        match config.retry.execute(move || extractor.extract(chunk)).await {
            Ok(found) => {
                tracing::debug!(chunk = i + 1, found = found.len(), "chunk extracted");
                raw.extend(found.into_iter().filter(is_valid_mention));
            }
            Err(err) => {
                tracing::warn!(chunk = i + 1, error = %err, "chunk extraction failed");
                failed_chunks += 1;
            }
        }
    }

    let all = dedup_mentions(raw);
    let (letters, acts): (Vec<_>, Vec<_>) = all.iter().cloned().partition(is_letter);
    ExtractedMentions {
        all,
        acts,
        letters,
        failed_chunks,
    }
}
