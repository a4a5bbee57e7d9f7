//! Query and suggestion types shared by every search surface
//!
//! This module defines:
//! - QueryRequest: typed query value (free text + equality filters)
//! - QuerySource / SuggestSource: backend selectors
//! - HighlightMarkers: marker pair for match highlighting
//! - QueryHit / QueryStats / QueryResponse: the response envelope
//! - SuggestRequest / Suggestion: fuzzy term suggestion surface
//!
//! The same request type is used for the primary index and the mirror;
//! the source selector picks the backend. Query construction is a typed
//! builder enumerating the legal operations (free text, equality filter,
//! result limit, highlighting) instead of an ad hoc structure assembled
//! at dispatch time.

use crate::types::{AttrValue, RecordId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Source selectors
// ============================================================================

/// Which backend answers a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuerySource {
    /// The embedded index maintained beside the primary record store
    #[default]
    Primary,
    /// The mirrored external search-engine index
    Mirror,
}

/// Which backend answers a suggestion query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SuggestSource {
    /// Trigram-similarity lookup against the vocabulary
    #[default]
    Vocabulary,
    /// The mirror engine's own edit-distance suggester
    Mirror,
}

// ============================================================================
// HighlightMarkers
// ============================================================================

/// Marker pair wrapped around matched tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightMarkers {
    /// Opening marker, e.g. `<em>`
    pub start: String,
    /// Closing marker, e.g. `</em>`
    pub end: String,
}

impl HighlightMarkers {
    /// Create a marker pair
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        HighlightMarkers {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for HighlightMarkers {
    fn default() -> Self {
        HighlightMarkers::new("<em>", "</em>")
    }
}

// ============================================================================
// QueryRequest
// ============================================================================

/// A free-text query with equality filters
///
/// # Filter semantics
///
/// Filters are hard equality predicates applied before ranking; there is
/// no partial credit. A request with empty text and at least one filter
/// matches every record passing the filters (score 0.0, identifier
/// order); empty text with no filters matches nothing. Both backends
/// implement the same semantic.
///
/// # Examples
///
/// ```
/// use vintry_core::query_types::{QueryRequest, QuerySource};
///
/// let req = QueryRequest::new("earthy merlot")
///     .with_filter("country", "FR")
///     .with_limit(20)
///     .with_source(QuerySource::Primary)
///     .with_highlight("<mark>", "</mark>");
///
/// assert_eq!(req.text, "earthy merlot");
/// assert_eq!(req.limit, 20);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// Free-text phrase; tokenized the same way as indexed fields
    pub text: String,
    /// Equality filters: attribute name -> required value
    pub filters: BTreeMap<String, AttrValue>,
    /// Maximum results to return
    pub limit: usize,
    /// Backend selector
    pub source: QuerySource,
    /// When set, hits carry marked-up field text
    pub highlight: Option<HighlightMarkers>,
}

impl QueryRequest {
    /// Create a request with defaults: limit 10, primary source, no
    /// filters, no highlighting
    pub fn new(text: impl Into<String>) -> Self {
        QueryRequest {
            text: text.into(),
            filters: BTreeMap::new(),
            limit: 10,
            source: QuerySource::default(),
            highlight: None,
        }
    }

    /// Builder: add an equality filter
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Builder: set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Builder: select the backend
    pub fn with_source(mut self, source: QuerySource) -> Self {
        self.source = source;
        self
    }

    /// Builder: enable highlighting with the given marker pair
    pub fn with_highlight(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.highlight = Some(HighlightMarkers::new(start, end));
        self
    }

    /// Whether the request carries any ranking signal at all
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.filters.is_empty()
    }
}

// ============================================================================
// Response envelope
// ============================================================================

/// A single ranked result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    /// Identifier of the matched record
    pub id: RecordId,
    /// Relevance score (higher = more relevant; 0.0 for pure-filter hits)
    pub score: f32,
    /// Rank in the result set (1-indexed)
    pub rank: u32,
    /// Field name -> marked-up text, present only when highlighting was
    /// requested; a field without any match carries its original text
    pub highlights: BTreeMap<String, String>,
}

impl QueryHit {
    /// Create a hit without highlights
    pub fn new(id: RecordId, score: f32, rank: u32) -> Self {
        QueryHit {
            id,
            score,
            rank,
            highlights: BTreeMap::new(),
        }
    }

    /// Builder: attach highlighted field text
    pub fn with_highlights(mut self, highlights: BTreeMap<String, String>) -> Self {
        self.highlights = highlights;
        self
    }
}

/// Execution statistics for a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Time spent answering (microseconds)
    pub elapsed_micros: u64,
    /// Candidates considered before the limit was applied
    pub candidates_considered: usize,
    /// Backend that produced the results
    pub source: QuerySource,
}

impl QueryStats {
    /// Create stats for a backend
    pub fn new(elapsed_micros: u64, candidates: usize, source: QuerySource) -> Self {
        QueryStats {
            elapsed_micros,
            candidates_considered: candidates,
            source,
        }
    }
}

/// Ranked results plus execution metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    /// Ranked hits (highest score first, identifier order within ties)
    pub hits: Vec<QueryHit>,
    /// Execution statistics
    pub stats: QueryStats,
}

impl QueryResponse {
    /// Check if the response has no hits
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Number of hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }
}

// ============================================================================
// Suggestions
// ============================================================================

/// Default minimum trigram similarity for suggestions
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.3;

/// A fuzzy term-suggestion request
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestRequest {
    /// The partial or misspelled term
    pub term: String,
    /// Minimum similarity to retain a candidate (vocabulary source only)
    pub min_similarity: f32,
    /// Maximum suggestions to return
    pub limit: usize,
    /// Backend selector
    pub source: SuggestSource,
}

impl SuggestRequest {
    /// Create a request with defaults: min similarity 0.3, limit 5,
    /// vocabulary source
    pub fn new(term: impl Into<String>) -> Self {
        SuggestRequest {
            term: term.into(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
            limit: 5,
            source: SuggestSource::default(),
        }
    }

    /// Builder: set the similarity threshold
    pub fn with_min_similarity(mut self, min: f32) -> Self {
        self.min_similarity = min;
        self
    }

    /// Builder: set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Builder: select the backend
    pub fn with_source(mut self, source: SuggestSource) -> Self {
        self.source = source;
        self
    }
}

/// A single ranked suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The suggested vocabulary term
    pub term: String,
    /// Similarity score in [0, 1]
    pub score: f32,
}

impl Suggestion {
    /// Create a suggestion
    pub fn new(term: impl Into<String>, score: f32) -> Self {
        Suggestion {
            term: term.into(),
            score,
        }
    }
}
