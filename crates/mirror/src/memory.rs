//! Embedded mirror engine implementation
//!
//! A self-contained [`MirrorEngine`] holding documents in memory, with
//! its own analyzer (lowercase word split, no stemming, no stopwords),
//! BM25 relevance, query-time field boosts, highlight span generation
//! and a Levenshtein-distance term suggester. It serves as the default
//! engine for embedded deployments and as the test double for the
//! synchronizer.
//!
//! Its analysis chain intentionally differs from `vintry-analysis`: the
//! mirror owns its relevance model, and the two suggestion sources are
//! not required to agree.

use crate::document::MirrorDocument;
use crate::engine::{MirrorEngine, MirrorHit, MirrorQuery};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use vintry_core::{AttrValue, DocOutcome, Error, RecordId, Result, Suggestion};

/// Default cap on a single document's serialized payload
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 512 * 1024;

/// Maximum edit distance the suggester considers
const MAX_EDIT_DISTANCE: usize = 2;

/// BM25 term saturation parameter
const K1: f32 = 1.2;
/// BM25 length normalization parameter
const B: f32 = 0.75;

// ============================================================================
// Analyzer
// ============================================================================

/// The engine's own analysis: lowercase, split on non-alphanumerics.
fn analyze(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Analyze with byte offsets of the original surface runs.
fn analyze_offsets(text: &str) -> Vec<(String, usize, usize)> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(s) = start.take() {
            out.push((text[s..i].to_lowercase(), s, i));
        }
    }
    if let Some(s) = start {
        out.push((text[s..].to_lowercase(), s, text.len()));
    }
    out
}

/// Levenshtein edit distance over chars (single-row DP).
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    let mut dp: Vec<usize> = (0..=b_len).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut prev = dp[0];
        dp[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let temp = dp[j + 1];
            dp[j + 1] = if ca == cb {
                prev
            } else {
                1 + prev.min(dp[j]).min(dp[j + 1])
            };
            prev = temp;
        }
    }
    dp[b_len]
}

// ============================================================================
// InMemoryMirrorEngine
// ============================================================================

/// Per-document state: the projection plus its analyzed field tokens
struct StoredDoc {
    doc: MirrorDocument,
    field_tokens: BTreeMap<String, Vec<String>>,
    token_count: usize,
}

/// In-process mirror engine
pub struct InMemoryMirrorEngine {
    docs: DashMap<RecordId, StoredDoc>,
    /// Term frequencies across everything ever indexed. Approximate by
    /// design: replaced documents are not decremented (suggestion
    /// vocabularies tolerate staleness).
    term_freqs: DashMap<String, u64>,
    available: AtomicBool,
    max_document_bytes: usize,
}

impl Default for InMemoryMirrorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryMirrorEngine {
    /// Create an empty, available engine
    pub fn new() -> Self {
        InMemoryMirrorEngine {
            docs: DashMap::new(),
            term_freqs: DashMap::new(),
            available: AtomicBool::new(true),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    /// Builder: cap the serialized size of accepted documents
    pub fn with_max_document_bytes(mut self, max: usize) -> Self {
        self.max_document_bytes = max;
        self
    }

    /// Toggle reachability (degraded-mode testing and ops drills)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    /// Number of documents held
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the engine holds no documents
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Whether a document is present
    pub fn contains(&self, id: &RecordId) -> bool {
        self.docs.contains_key(id)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(Error::IndexUnavailable("mirror engine offline".to_string()))
        }
    }

    /// Inverse document frequency with the usual smoothing.
    fn idf(&self, term: &str, total_docs: usize) -> f32 {
        let df = self
            .docs
            .iter()
            .filter(|entry| {
                entry
                    .field_tokens
                    .values()
                    .any(|tokens| tokens.iter().any(|t| t == term))
            })
            .count() as f32;
        let n = total_docs as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Average analyzed length over all documents.
    fn avg_doc_len(&self) -> f32 {
        let total = self.docs.len();
        if total == 0 {
            return 0.0;
        }
        let sum: usize = self.docs.iter().map(|entry| entry.token_count).sum();
        sum as f32 / total as f32
    }

    /// Score one document: summed per-field BM25, boosted per query.
    fn score_doc(
        &self,
        stored: &StoredDoc,
        query: &MirrorQuery,
        idf: &FxHashMap<String, f32>,
        avg_len: f32,
    ) -> f32 {
        let doc_len = stored.token_count as f32;
        let mut score = 0.0;
        for (field, tokens) in &stored.field_tokens {
            let boost = query.boost_for(field);
            let mut tf_map: FxHashMap<&str, u32> = FxHashMap::default();
            for token in tokens {
                *tf_map.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, term_idf) in idf {
                let tf = tf_map.get(term.as_str()).copied().unwrap_or(0) as f32;
                if tf == 0.0 {
                    continue;
                }
                let avg = avg_len.max(1.0);
                let tf_component =
                    (tf * (K1 + 1.0)) / (tf + K1 * (1.0 - B + B * doc_len / avg));
                score += boost * term_idf * tf_component;
            }
        }
        score
    }

    /// Wrap matched surface tokens of every field with the markers.
    fn highlight_fields(
        &self,
        stored: &StoredDoc,
        query_terms: &HashSet<String>,
        start: &str,
        end: &str,
    ) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for (field, text) in &stored.doc.fields {
            let mut marked = String::with_capacity(text.len());
            let mut cursor = 0;
            for (token, token_start, token_end) in analyze_offsets(text) {
                if query_terms.contains(&token) {
                    marked.push_str(&text[cursor..token_start]);
                    marked.push_str(start);
                    marked.push_str(&text[token_start..token_end]);
                    marked.push_str(end);
                    cursor = token_end;
                }
            }
            marked.push_str(&text[cursor..]);
            out.insert(field.clone(), marked);
        }
        out
    }
}

impl MirrorEngine for InMemoryMirrorEngine {
    fn name(&self) -> &str {
        "in-memory"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    fn put_batch(&self, docs: Vec<MirrorDocument>) -> Result<Vec<DocOutcome>> {
        self.ensure_available()?;

        let mut outcomes = Vec::with_capacity(docs.len());
        for doc in docs {
            if doc.payload_bytes() > self.max_document_bytes {
                outcomes.push(DocOutcome::failed(
                    doc.id,
                    format!(
                        "document exceeds {} byte limit",
                        self.max_document_bytes
                    ),
                ));
                continue;
            }

            let mut field_tokens = BTreeMap::new();
            let mut token_count = 0;
            for (field, text) in &doc.fields {
                let tokens = analyze(text);
                token_count += tokens.len();
                for token in &tokens {
                    *self.term_freqs.entry(token.clone()).or_insert(0) += 1;
                }
                field_tokens.insert(field.clone(), tokens);
            }

            let id = doc.id;
            self.docs.insert(
                id,
                StoredDoc {
                    doc,
                    field_tokens,
                    token_count,
                },
            );
            outcomes.push(DocOutcome::ok(id));
        }
        Ok(outcomes)
    }

    fn delete(&self, id: RecordId) -> Result<()> {
        self.ensure_available()?;
        self.docs.remove(&id);
        Ok(())
    }

    fn search(&self, query: &MirrorQuery) -> Result<Vec<MirrorHit>> {
        self.ensure_available()?;

        let query_terms = analyze(&query.text);
        if query_terms.is_empty() {
            if query.filters.is_empty() {
                return Ok(vec![]);
            }
            // Pure-filter browse, same semantic as the primary path
            let mut ids: Vec<RecordId> = self
                .docs
                .iter()
                .filter(|entry| attrs_match(&entry.doc.attrs, &query.filters))
                .map(|entry| *entry.key())
                .collect();
            ids.sort_unstable();
            ids.truncate(query.limit);
            return Ok(ids
                .into_iter()
                .map(|id| MirrorHit {
                    id,
                    score: 0.0,
                    highlights: BTreeMap::new(),
                })
                .collect());
        }

        let total_docs = self.docs.len();
        let unique_terms: HashSet<String> = query_terms.iter().cloned().collect();
        let idf: FxHashMap<String, f32> = unique_terms
            .iter()
            .map(|t| (t.clone(), self.idf(t, total_docs)))
            .collect();
        let avg_len = self.avg_doc_len();

        let mut hits: Vec<MirrorHit> = Vec::new();
        for entry in self.docs.iter() {
            if !attrs_match(&entry.doc.attrs, &query.filters) {
                continue;
            }
            let score = self.score_doc(entry.value(), query, &idf, avg_len);
            if score <= 0.0 {
                continue;
            }
            let highlights = match &query.highlight {
                Some(markers) => self.highlight_fields(
                    entry.value(),
                    &unique_terms,
                    &markers.start,
                    &markers.end,
                ),
                None => BTreeMap::new(),
            };
            hits.push(MirrorHit {
                id: *entry.key(),
                score,
                highlights,
            });
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(CmpOrdering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(query.limit);
        Ok(hits)
    }

    fn suggest(&self, term: &str, limit: usize) -> Result<Vec<Suggestion>> {
        self.ensure_available()?;

        let query = term.trim().to_lowercase();
        if query.is_empty() {
            return Ok(vec![]);
        }

        let mut ranked: Vec<(usize, u64, String)> = self
            .term_freqs
            .iter()
            .filter_map(|entry| {
                let candidate = entry.key();
                let dist = levenshtein(&query, candidate);
                // Known terms are not re-suggested; distance 0 is the
                // caller's own input
                if dist == 0 || dist > MAX_EDIT_DISTANCE {
                    return None;
                }
                Some((dist, *entry.value(), candidate.clone()))
            })
            .collect();

        ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)).then_with(|| a.2.cmp(&b.2)));
        ranked.truncate(limit);

        Ok(ranked
            .into_iter()
            .map(|(dist, _, candidate)| {
                let max_len = query.chars().count().max(candidate.chars().count()).max(1);
                let score = 1.0 - dist as f32 / max_len as f32;
                Suggestion::new(candidate, score)
            })
            .collect())
    }
}

/// All filters must match exactly; type mismatches never match.
fn attrs_match(attrs: &BTreeMap<String, AttrValue>, filters: &BTreeMap<String, AttrValue>) -> bool {
    filters
        .iter()
        .all(|(field, value)| attrs.get(field) == Some(value))
}
