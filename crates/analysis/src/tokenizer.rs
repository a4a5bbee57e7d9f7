//! Text tokenizer for search operations
//!
//! Pipeline: UAX#29 word boundaries → strip possessives → remove non-alpha
//!           → lowercase → filter short tokens → remove stopwords → Porter stem
//!
//! The tokenizer is pure and deterministic: no I/O, no configuration
//! state. Empty input yields an empty sequence, never an error.

use crate::stemmer;
use unicode_segmentation::UnicodeSegmentation;

/// Standard English stopwords (Lucene's default set).
///
/// These high-frequency words carry little discriminative value for
/// ranking and are filtered out during tokenization.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Check if a token is a stopword.
#[inline]
fn is_stopword(token: &str) -> bool {
    // Linear scan is fast for ~33 entries (all < cache line).
    STOPWORDS.contains(&token)
}

/// Strip English possessive suffix (`'s` / `\u{2019}s`).
#[inline]
fn strip_possessive(word: &str) -> &str {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("\u{2019}s"))
        .unwrap_or(word)
}

/// A normalized term plus its surface location.
///
/// `position` is the surface-word ordinal: words removed by the length or
/// stopword filters still consume a position, so relative distance between
/// surviving terms is preserved. `start..end` is the byte range of the
/// original (non-normalized) surface word, used by the highlighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Normalized (case-folded, stemmed) term
    pub term: String,
    /// Surface-word ordinal
    pub position: u32,
    /// Byte offset of the surface word
    pub start: usize,
    /// Byte offset one past the surface word
    pub end: usize,
}

/// Normalize a single surface word; None if it is filtered out.
fn normalize_word(word: &str) -> Option<String> {
    let word = strip_possessive(word);
    let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
    let lowered = cleaned.to_lowercase();
    if lowered.len() < 2 || is_stopword(&lowered) {
        return None;
    }
    Some(stemmer::stem(&lowered))
}

/// Tokenize text into terms with surface positions.
///
/// # Example
///
/// ```
/// use vintry_analysis::tokenizer::tokenize_tokens;
///
/// let tokens = tokenize_tokens("The Quick Brown Foxes");
/// let terms: Vec<&str> = tokens.iter().map(|t| t.term.as_str()).collect();
/// assert_eq!(terms, vec!["quick", "brown", "fox"]);
/// // "The" consumed position 0
/// assert_eq!(tokens[0].position, 1);
/// ```
pub fn tokenize_tokens(text: &str) -> Vec<Token> {
    text.unicode_word_indices()
        .enumerate()
        .filter_map(|(ordinal, (start, word))| {
            normalize_word(word).map(|term| Token {
                term,
                position: ordinal as u32,
                start,
                end: start + word.len(),
            })
        })
        .collect()
}

/// Tokenize text into searchable terms.
///
/// # Example
///
/// ```
/// use vintry_analysis::tokenizer::tokenize;
///
/// let tokens = tokenize("The Quick Brown Foxes");
/// assert_eq!(tokens, vec!["quick", "brown", "fox"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words()
        .filter_map(normalize_word)
        .collect()
}

/// Tokenize and deduplicate for query processing.
///
/// # Example
///
/// ```
/// use vintry_analysis::tokenizer::tokenize_unique;
///
/// let tokens = tokenize_unique("testing tests TESTS");
/// assert_eq!(tokens, vec!["test"]);
/// ```
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
