//! Trigram shingles and Jaccard similarity for fuzzy term matching
//!
//! Terms are padded at word boundaries (two leading spaces, one trailing,
//! the pg_trgm convention) and decomposed into overlapping 3-character
//! shingles. Similarity between two terms is the Jaccard coefficient of
//! their shingle sets: `|intersection| / |union|`.

use std::collections::BTreeSet;

/// Decompose a term into its padded trigram shingle set.
///
/// The input is case-folded first so similarity is case-insensitive.
/// An empty or whitespace-only term yields an empty set.
///
/// # Example
///
/// ```
/// use vintry_analysis::shingle::shingles;
///
/// let set = shingles("cab");
/// assert!(set.contains("  c"));
/// assert!(set.contains(" ca"));
/// assert!(set.contains("cab"));
/// assert!(set.contains("ab "));
/// ```
pub fn shingles(term: &str) -> BTreeSet<String> {
    let trimmed = term.trim();
    if trimmed.is_empty() {
        return BTreeSet::new();
    }
    let padded: Vec<char> = "  "
        .chars()
        .chain(trimmed.to_lowercase().chars())
        .chain(" ".chars())
        .collect();
    padded
        .windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Trigram-set Jaccard similarity between two terms, in [0, 1].
///
/// Symmetric by construction: `similarity(a, b) == similarity(b, a)`.
/// Returns 0.0 when either term produces no shingles.
///
/// # Example
///
/// ```
/// use vintry_analysis::shingle::similarity;
///
/// let sim = similarity("cabernay", "cabernet");
/// assert!(sim >= 0.3);
/// assert_eq!(similarity("merlot", "merlot"), 1.0);
/// ```
pub fn similarity(a: &str, b: &str) -> f32 {
    let sa = shingles(a);
    let sb = shingles(b);
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.len() + sb.len() - intersection;
    intersection as f32 / union as f32
}
