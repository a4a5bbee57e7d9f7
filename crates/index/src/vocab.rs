//! Term vocabulary and trigram-based fuzzy suggestion
//!
//! The vocabulary is a deduplicated set of every normalized term observed
//! across all records, with a corpus frequency counter per term. Entries
//! are never removed when source terms disappear after a record update or
//! delete: the vocabulary is append-only by design, keeping suggestion
//! quality stable.
//!
//! Suggestion lookups score candidates by trigram-set Jaccard similarity.
//! Small vocabularies are scanned linearly; past `SCAN_THRESHOLD` terms a
//! shingle inverted index narrows the candidate set first. The linear
//! path is a known small-corpus limitation, not the general algorithm.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use vintry_analysis::shingle::{shingles, similarity};
use vintry_analysis::tokenizer::tokenize;
use vintry_core::{Record, Suggestion};

/// Vocabulary size above which suggestion stops scanning linearly and
/// consults the shingle inverted index instead.
pub const SCAN_THRESHOLD: usize = 512;

/// Append-only term vocabulary with a trigram shingle index
pub struct Vocabulary {
    /// Term -> corpus frequency (number of observed occurrences)
    terms: DashMap<String, u64>,

    /// Shingle -> terms containing it; populated on first sight of a term
    shingle_index: DashMap<String, Vec<String>>,

    /// Linear-scan cutoff, overridable for tests
    scan_threshold: usize,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// Create an empty vocabulary
    pub fn new() -> Self {
        Vocabulary {
            terms: DashMap::new(),
            shingle_index: DashMap::new(),
            scan_threshold: SCAN_THRESHOLD,
        }
    }

    /// Create a vocabulary with a custom linear-scan cutoff
    pub fn with_scan_threshold(threshold: usize) -> Self {
        Vocabulary {
            scan_threshold: threshold,
            ..Self::new()
        }
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether a term has been observed
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Corpus frequency of a term, 0 when never observed
    pub fn frequency(&self, term: &str) -> u64 {
        self.terms.get(term).map(|r| *r).unwrap_or(0)
    }

    /// Ingest every normalized term of a record's text fields.
    ///
    /// Upsert-ignore-on-conflict: terms already present are counted, not
    /// duplicated; new terms also register their shingles. Never errors.
    pub fn ingest(&self, record: &Record) {
        for value in record.fields.values() {
            if let Some(text) = value {
                for term in tokenize(text) {
                    self.observe(term);
                }
            }
        }
    }

    /// Record one observation of a term.
    pub fn observe(&self, term: String) {
        match self.terms.entry(term) {
            Entry::Occupied(mut occupied) => {
                *occupied.get_mut() += 1;
            }
            Entry::Vacant(vacant) => {
                let term = vacant.key().clone();
                for shingle in shingles(&term) {
                    self.shingle_index
                        .entry(shingle)
                        .or_default()
                        .push(term.clone());
                }
                vacant.insert(1);
            }
        }
    }

    /// Rank the closest known terms for a possibly misspelled query.
    ///
    /// Candidates at or above `min_similarity` are ordered by similarity
    /// descending, corpus frequency descending, then lexicographically.
    pub fn suggest(&self, query_term: &str, min_similarity: f32, max_results: usize) -> Vec<Suggestion> {
        let query = query_term.trim().to_lowercase();
        if query.is_empty() {
            return vec![];
        }

        let candidates = self.candidates(&query);

        let mut ranked: Vec<(String, f32, u64)> = candidates
            .into_iter()
            .filter_map(|term| {
                let sim = similarity(&query, &term);
                if sim >= min_similarity {
                    let freq = self.frequency(&term);
                    Some((term, sim, freq))
                } else {
                    None
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.2.cmp(&a.2))
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked.truncate(max_results);

        ranked
            .into_iter()
            .map(|(term, sim, _)| Suggestion::new(term, sim))
            .collect()
    }

    /// Candidate terms sharing at least one shingle with the query, or
    /// the whole vocabulary below the scan threshold.
    fn candidates(&self, query: &str) -> BTreeSet<String> {
        if self.terms.len() <= self.scan_threshold {
            return self.terms.iter().map(|e| e.key().clone()).collect();
        }
        let mut set = BTreeSet::new();
        for shingle in shingles(query) {
            if let Some(terms) = self.shingle_index.get(&shingle) {
                set.extend(terms.iter().cloned());
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vintry_core::RecordId;

    fn ingest_description(vocab: &Vocabulary, text: &str) {
        let record = Record::new(RecordId::new()).with_field("description", text);
        vocab.ingest(&record);
    }

    #[test]
    fn test_ingest_deduplicates() {
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "bold bold merlot");

        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.frequency("bold"), 2);
        assert_eq!(vocab.frequency("merlot"), 1);
    }

    #[test]
    fn test_ingest_normalizes() {
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "The Earthy tannins");

        // "the" is a stopword; remaining terms are stemmed
        assert!(vocab.contains("earthi"));
        assert!(vocab.contains("tannin"));
        assert!(!vocab.contains("the"));
        assert!(!vocab.contains("Earthy"));
    }

    #[test]
    fn test_ingest_skips_null_fields() {
        let vocab = Vocabulary::new();
        let record = Record::new(RecordId::new())
            .with_field("variety", "Merlot")
            .with_null_field("description");
        vocab.ingest(&record);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn test_suggest_misspelling() {
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "cabernet merlot zinfandel");

        let suggestions = vocab.suggest("cabernay", 0.3, 5);
        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0].term, "cabernet");
        assert!(suggestions[0].score >= 0.3);
    }

    #[test]
    fn test_suggest_respects_threshold() {
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "cabernet");

        // A near-total mismatch falls below any sane threshold
        let suggestions = vocab.suggest("xyzzy", 0.3, 5);
        assert!(suggestions.is_empty());

        // Dropping the threshold to zero admits everything sharing the
        // candidate set
        let loose = vocab.suggest("cabernet", 0.0, 5);
        assert!(!loose.is_empty());
    }

    #[test]
    fn test_suggest_orders_by_similarity_then_frequency() {
        let vocab = Vocabulary::new();
        // "bold" observed three times, "bolt" once; both are one edit
        // from the query but identical trigram overlap differs
        ingest_description(&vocab, "bold bold bold bolt");

        let suggestions = vocab.suggest("bold", 0.1, 5);
        assert_eq!(suggestions[0].term, "bold");
        assert_eq!(suggestions[0].score, 1.0);
    }

    #[test]
    fn test_suggest_frequency_breaks_ties() {
        let vocab = Vocabulary::new();
        // "merlota" and "merlotb" sit at identical trigram distance from
        // the query; only their corpus frequency differs
        ingest_description(&vocab, "merlota merlota merlota merlotb");

        let suggestions = vocab.suggest("merlot", 0.1, 5);
        assert_eq!(suggestions.len(), 2);
        assert!((suggestions[0].score - suggestions[1].score).abs() < f32::EPSILON);
        assert_eq!(suggestions[0].term, "merlota");
    }

    #[test]
    fn test_suggest_case_folds_query() {
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "cabernet");
        let suggestions = vocab.suggest("CABERNAY", 0.3, 5);
        assert_eq!(suggestions[0].term, "cabernet");
    }

    #[test]
    fn test_suggest_empty_query() {
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "cabernet");
        assert!(vocab.suggest("", 0.3, 5).is_empty());
        assert!(vocab.suggest("   ", 0.3, 5).is_empty());
    }

    #[test]
    fn test_suggest_limit() {
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "merlot merlos merloz merlow");
        let suggestions = vocab.suggest("merlo", 0.1, 2);
        assert_eq!(suggestions.len(), 2);
    }

    #[test]
    fn test_shingle_index_path_matches_scan_path() {
        // Force the indexed path with a tiny threshold and compare with
        // a linear-scan vocabulary over the same corpus
        let indexed = Vocabulary::with_scan_threshold(0);
        let scanned = Vocabulary::with_scan_threshold(usize::MAX);
        for vocab in [&indexed, &scanned] {
            ingest_description(vocab, "cabernet merlot zinfandel chardonnay");
        }

        let a = indexed.suggest("cabernay", 0.3, 5);
        let b = scanned.suggest("cabernay", 0.3, 5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_vocabulary_is_append_only() {
        // Updating a record so a term disappears does not prune it; the
        // vocabulary deliberately never forgets
        let vocab = Vocabulary::new();
        ingest_description(&vocab, "earthy");
        ingest_description(&vocab, "bold");
        assert!(vocab.contains("earthi"));
        assert!(vocab.contains("bold"));
    }
}
