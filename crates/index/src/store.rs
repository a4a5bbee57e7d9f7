//! Embedded index maintained beside the primary record store
//!
//! This module provides:
//! - PrimaryIndex with per-term posting lists over stored search vectors
//! - Idempotent upsert (reindexing replaces prior posting state)
//! - Ranked querying with hard equality filters applied before scoring
//! - Version watermark and document statistics
//!
//! # Thread Safety
//!
//! Uses DashMap for concurrent access; index rebuilds for different
//! records proceed in parallel. Writes to the same record serialize at
//! the primary store upstream.

use crate::vector::SearchVector;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use vintry_analysis::tokenizer::tokenize;
use vintry_core::schema::CatalogSchema;
use vintry_core::{AttrValue, Error, RecordId, Result};

// ============================================================================
// Postings
// ============================================================================

/// Entry in a posting list: a record and its stored term weight
#[derive(Debug, Clone, Copy)]
pub struct Posting {
    /// Owning record
    pub id: RecordId,
    /// Field-weight-adjusted term weight from the record's vector
    pub weight: f32,
}

/// List of records containing a term
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    /// Record entries
    pub entries: Vec<Posting>,
}

impl PostingList {
    /// Create a new empty posting list
    pub fn new() -> Self {
        PostingList { entries: vec![] }
    }

    /// Add an entry to the posting list
    pub fn add(&mut self, posting: Posting) {
        self.entries.push(posting);
    }

    /// Remove entries for a record, returning how many were dropped
    pub fn remove_record(&mut self, id: &RecordId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|p| &p.id != id);
        before - self.entries.len()
    }

    /// Number of records containing this term
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the posting list is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Ranking output
// ============================================================================

/// A record with its relevance score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRecord {
    /// Matched record
    pub id: RecordId,
    /// Normalized dot-product score (0.0 for pure-filter hits)
    pub score: f32,
}

/// Ranked query output plus candidate accounting
#[derive(Debug, Clone, Default)]
pub struct Ranked {
    /// Hits in descending score order, identifier order within ties
    pub hits: Vec<ScoredRecord>,
    /// Candidates considered before the limit was applied
    pub candidates: usize,
}

// ============================================================================
// PrimaryIndex
// ============================================================================

/// Per-record document state held by the index
#[derive(Debug)]
struct DocEntry {
    vector: SearchVector,
    attrs: BTreeMap<String, AttrValue>,
}

/// Inverted index over search vectors, co-located with the record store
///
/// The write path updates this index synchronously on every record
/// commit, so queries observe their own writes. The version watermark
/// increments on every mutation so callers can assert index freshness.
pub struct PrimaryIndex {
    /// Declared catalog shape; filter validation happens here
    schema: Arc<CatalogSchema>,

    /// Term -> posting list
    postings: DashMap<String, PostingList>,

    /// Record -> stored vector + filterable attributes
    docs: DashMap<RecordId, DocEntry>,

    /// Term -> document frequency
    doc_freqs: DashMap<String, usize>,

    /// Total records indexed
    total_docs: AtomicUsize,

    /// Version watermark, incremented on every update
    version: AtomicU64,
}

impl PrimaryIndex {
    /// Create an empty index for the given schema
    pub fn new(schema: Arc<CatalogSchema>) -> Self {
        PrimaryIndex {
            schema,
            postings: DashMap::new(),
            docs: DashMap::new(),
            doc_freqs: DashMap::new(),
            total_docs: AtomicUsize::new(0),
            version: AtomicU64::new(0),
        }
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    /// Total records currently indexed
    pub fn total_docs(&self) -> usize {
        self.total_docs.load(Ordering::Acquire)
    }

    /// Number of records whose vector contains a term
    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freqs.get(term).map(|r| *r).unwrap_or(0)
    }

    /// Current version watermark
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Check if the index is at least at the given version
    pub fn is_at_version(&self, min_version: u64) -> bool {
        self.version.load(Ordering::Acquire) >= min_version
    }

    /// Stored vector for a record (cloned), if indexed
    pub fn vector(&self, id: &RecordId) -> Option<SearchVector> {
        self.docs.get(id).map(|e| e.vector.clone())
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Upsert a record's vector and filter attributes.
    ///
    /// Idempotent: reindexing removes the previous posting state first,
    /// so the same field values always produce the same index state.
    pub fn index(&self, id: RecordId, vector: SearchVector, attrs: BTreeMap<String, AttrValue>) {
        if self.docs.contains_key(&id) {
            self.remove(&id);
        }

        for (term, entry) in vector.terms() {
            self.postings.entry(term.to_string()).or_default().add(Posting {
                id,
                weight: entry.weight,
            });
            self.doc_freqs
                .entry(term.to_string())
                .and_modify(|c| *c += 1)
                .or_insert(1);
        }

        self.docs.insert(id, DocEntry { vector, attrs });
        self.total_docs.fetch_add(1, Ordering::Release);
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Remove a record's vector and postings.
    ///
    /// Returns false if the record was not indexed.
    pub fn remove(&self, id: &RecordId) -> bool {
        let Some((_, entry)) = self.docs.remove(id) else {
            return false;
        };

        for (term, _) in entry.vector.terms() {
            if let Some(mut list) = self.postings.get_mut(term) {
                if list.remove_record(id) > 0 {
                    self.doc_freqs
                        .entry(term.to_string())
                        .and_modify(|c| *c = c.saturating_sub(1));
                }
            }
            self.postings.remove_if(term, |_, list| list.is_empty());
        }

        self.total_docs.fetch_sub(1, Ordering::Release);
        self.version.fetch_add(1, Ordering::Release);
        true
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// Ranked query: free text plus hard equality filters.
    ///
    /// Query text is tokenized exactly as indexed fields were. The score
    /// of a matching record is the dot product of stored term weights and
    /// query term frequencies, divided by the vector's L2 norm so long
    /// documents are not favored. Filters are applied before ranking; a
    /// filter on an undeclared attribute is a validation error.
    ///
    /// Empty query text with at least one filter matches every record
    /// passing the filters (score 0.0, identifier order); empty text with
    /// no filters matches nothing.
    pub fn query(
        &self,
        text: &str,
        filters: &BTreeMap<String, AttrValue>,
        limit: usize,
    ) -> Result<Ranked> {
        for field in filters.keys() {
            if !self.schema.is_filter_field(field) {
                return Err(Error::UnknownFilterField {
                    field: field.clone(),
                });
            }
        }

        let query_terms = tokenize(text);
        if query_terms.is_empty() {
            if filters.is_empty() {
                return Ok(Ranked::default());
            }
            return Ok(self.filter_scan(filters, limit));
        }

        // Query term frequencies
        let mut qtf: FxHashMap<&str, u32> = FxHashMap::default();
        for term in &query_terms {
            *qtf.entry(term.as_str()).or_insert(0) += 1;
        }

        // Accumulate dot products from posting lists
        let mut dots: FxHashMap<RecordId, f32> = FxHashMap::default();
        for (term, tf) in &qtf {
            if let Some(list) = self.postings.get(*term) {
                for posting in &list.entries {
                    *dots.entry(posting.id).or_insert(0.0) += posting.weight * *tf as f32;
                }
            }
        }
        let candidates = dots.len();

        let mut hits: Vec<ScoredRecord> = dots
            .into_iter()
            .filter_map(|(id, dot)| {
                let entry = self.docs.get(&id)?;
                if !attrs_match(&entry.attrs, filters) {
                    return None;
                }
                let norm = entry.vector.norm();
                let score = if norm > 0.0 { dot / norm } else { 0.0 };
                Some(ScoredRecord { id, score })
            })
            .collect();

        sort_ranked(&mut hits);
        hits.truncate(limit);

        Ok(Ranked { hits, candidates })
    }

    /// Pure-filter browse: all records passing the filters, id order.
    fn filter_scan(&self, filters: &BTreeMap<String, AttrValue>, limit: usize) -> Ranked {
        let mut ids: Vec<RecordId> = self
            .docs
            .iter()
            .filter(|entry| attrs_match(&entry.attrs, filters))
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        let candidates = ids.len();
        ids.truncate(limit);

        Ranked {
            hits: ids
                .into_iter()
                .map(|id| ScoredRecord { id, score: 0.0 })
                .collect(),
            candidates,
        }
    }
}

/// All filters must match exactly; type mismatches never match.
fn attrs_match(attrs: &BTreeMap<String, AttrValue>, filters: &BTreeMap<String, AttrValue>) -> bool {
    filters
        .iter()
        .all(|(field, value)| attrs.get(field) == Some(value))
}

/// Descending score, ascending record id within ties.
fn sort_ranked(hits: &mut [ScoredRecord]) {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(CmpOrdering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::build_vector;
    use vintry_core::schema::WeightTier;
    use vintry_core::Record;

    fn wine_schema() -> Arc<CatalogSchema> {
        Arc::new(
            CatalogSchema::builder()
                .text_field("variety", WeightTier::A)
                .text_field("winery", WeightTier::B)
                .text_field("description", WeightTier::D)
                .filter_field("country")
                .filter_field("points")
                .build(),
        )
    }

    fn index_record(index: &PrimaryIndex, schema: &CatalogSchema, record: &Record) {
        let vector = build_vector(record, schema);
        index.index(record.id, vector, record.attrs.clone());
    }

    fn merlot(schema: &CatalogSchema, index: &PrimaryIndex) -> RecordId {
        let record = Record::new(RecordId::new())
            .with_field("variety", "Merlot")
            .with_field("winery", "Staglin")
            .with_attr("country", "US");
        index_record(index, schema, &record);
        record.id
    }

    fn cabernet(schema: &CatalogSchema, index: &PrimaryIndex) -> RecordId {
        let record = Record::new(RecordId::new())
            .with_field("variety", "Cabernet Sauvignon")
            .with_field("description", "hints of merlot and oak")
            .with_attr("country", "FR");
        index_record(index, schema, &record);
        record.id
    }

    #[test]
    fn test_index_and_stats() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        merlot(&schema, &index);
        cabernet(&schema, &index);

        assert_eq!(index.total_docs(), 2);
        assert_eq!(index.doc_freq("merlot"), 2);
        assert_eq!(index.doc_freq("staglin"), 1);
        assert_eq!(index.doc_freq("missing"), 0);
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        let record = Record::new(RecordId::new()).with_field("variety", "Merlot");
        index_record(&index, &schema, &record);
        let first = index.vector(&record.id).unwrap();

        index_record(&index, &schema, &record);
        let second = index.vector(&record.id).unwrap();

        assert_eq!(first, second);
        assert_eq!(index.total_docs(), 1);
        assert_eq!(index.doc_freq("merlot"), 1);
    }

    #[test]
    fn test_reindex_drops_stale_terms() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        let id = RecordId::new();
        let old = Record::new(id).with_field("variety", "Merlot");
        index_record(&index, &schema, &old);

        let new = Record::new(id).with_field("variety", "Zinfandel");
        index_record(&index, &schema, &new);

        assert_eq!(index.doc_freq("merlot"), 0);
        assert_eq!(index.doc_freq("zinfandel"), 1);
        let results = index.query("merlot", &BTreeMap::new(), 10).unwrap();
        assert!(results.hits.is_empty());
    }

    #[test]
    fn test_remove_record() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        let id = merlot(&schema, &index);
        assert!(index.remove(&id));
        assert!(!index.remove(&id));

        assert_eq!(index.total_docs(), 0);
        assert_eq!(index.doc_freq("merlot"), 0);
        assert!(index.vector(&id).is_none());
    }

    #[test]
    fn test_version_watermark_increments() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        let v0 = index.version();
        let id = merlot(&schema, &index);
        let v1 = index.version();
        index.remove(&id);
        let v2 = index.version();

        assert!(v1 > v0);
        assert!(v2 > v1);
        assert!(index.is_at_version(v1));
    }

    #[test]
    fn test_query_ranks_variety_above_description() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        let merlot_id = merlot(&schema, &index);
        let cabernet_id = cabernet(&schema, &index);

        let results = index.query("merlot", &BTreeMap::new(), 10).unwrap();
        assert_eq!(results.hits.len(), 2);
        assert_eq!(results.hits[0].id, merlot_id);
        assert_eq!(results.hits[1].id, cabernet_id);
        assert!(results.hits[0].score > results.hits[1].score);
    }

    #[test]
    fn test_query_applies_filters_before_ranking() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        merlot(&schema, &index);
        let cabernet_id = cabernet(&schema, &index);

        let mut filters = BTreeMap::new();
        filters.insert("country".to_string(), AttrValue::from("FR"));

        let results = index.query("merlot", &filters, 10).unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].id, cabernet_id);
    }

    #[test]
    fn test_query_unknown_filter_field_is_error() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());
        merlot(&schema, &index);

        let mut filters = BTreeMap::new();
        filters.insert("color".to_string(), AttrValue::from("red"));

        let err = index.query("merlot", &filters, 10).unwrap_err();
        assert!(matches!(err, Error::UnknownFilterField { field } if field == "color"));
    }

    #[test]
    fn test_empty_text_with_filters_matches_all_passing() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        let merlot_id = merlot(&schema, &index);
        cabernet(&schema, &index);

        let mut filters = BTreeMap::new();
        filters.insert("country".to_string(), AttrValue::from("US"));

        let results = index.query("", &filters, 10).unwrap();
        assert_eq!(results.hits.len(), 1);
        assert_eq!(results.hits[0].id, merlot_id);
        assert_eq!(results.hits[0].score, 0.0);
    }

    #[test]
    fn test_empty_text_without_filters_matches_nothing() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());
        merlot(&schema, &index);

        let results = index.query("", &BTreeMap::new(), 10).unwrap();
        assert!(results.hits.is_empty());
    }

    #[test]
    fn test_filter_type_mismatch_never_matches() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        let record = Record::new(RecordId::new())
            .with_field("variety", "Merlot")
            .with_attr("points", 91i64);
        index_record(&index, &schema, &record);

        let mut filters = BTreeMap::new();
        filters.insert("points".to_string(), AttrValue::Float(91.0));

        let results = index.query("merlot", &filters, 10).unwrap();
        assert!(results.hits.is_empty());
    }

    #[test]
    fn test_query_respects_limit_and_reports_candidates() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        for i in 0..10 {
            let record = Record::new(RecordId::new())
                .with_field("description", format!("bold wine number {i}"));
            index_record(&index, &schema, &record);
        }

        let results = index.query("bold", &BTreeMap::new(), 3).unwrap();
        assert_eq!(results.hits.len(), 3);
        assert_eq!(results.candidates, 10);
    }

    #[test]
    fn test_score_ties_break_by_record_id() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());

        for _ in 0..5 {
            let record = Record::new(RecordId::new()).with_field("variety", "Merlot");
            index_record(&index, &schema, &record);
        }

        let results = index.query("merlot", &BTreeMap::new(), 10).unwrap();
        for pair in results.hits.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn test_repeated_query_term_raises_contribution() {
        let schema = wine_schema();
        let index = PrimaryIndex::new(schema.clone());
        merlot(&schema, &index);

        let single = index.query("merlot", &BTreeMap::new(), 10).unwrap();
        let doubled = index.query("merlot merlot", &BTreeMap::new(), 10).unwrap();
        assert!(doubled.hits[0].score > single.hits[0].score);
    }
}
