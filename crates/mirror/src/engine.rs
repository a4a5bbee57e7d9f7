//! Mirror engine client interface
//!
//! The mirror engine is an external collaborator with its own relevance
//! model, highlighter and suggester. This module defines:
//! - MirrorEngine: the client trait the synchronizer talks through
//! - MirrorQuery: typed query value with per-query field boosts
//! - MirrorHit: a ranked document with optional highlight spans
//!
//! The client object is constructed once at startup, shared behind an
//! `Arc`, and never reinitialized mid-process.

use crate::document::MirrorDocument;
use std::collections::BTreeMap;
use vintry_core::{AttrValue, DocOutcome, HighlightMarkers, RecordId, Result, Suggestion};

// ============================================================================
// MirrorQuery
// ============================================================================

/// Typed query for the mirror engine
///
/// Index-time boosting is disallowed by this component's design, so the
/// per-field boosts must be re-specified on every query; a field without
/// a boost entry contributes at 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorQuery {
    /// Free-text phrase, interpreted by the engine's own analyzer
    pub text: String,
    /// Hard equality filters, same semantics as the primary path
    pub filters: BTreeMap<String, AttrValue>,
    /// Per-field boost multipliers for this query only
    pub boosts: BTreeMap<String, f32>,
    /// Maximum results to return
    pub limit: usize,
    /// When set, hits carry marked-up field text
    pub highlight: Option<HighlightMarkers>,
}

impl MirrorQuery {
    /// Create a query with defaults: limit 10, no filters, unit boosts,
    /// no highlighting
    pub fn new(text: impl Into<String>) -> Self {
        MirrorQuery {
            text: text.into(),
            filters: BTreeMap::new(),
            boosts: BTreeMap::new(),
            limit: 10,
            highlight: None,
        }
    }

    /// Builder: add an equality filter
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Builder: boost a field for this query
    pub fn with_boost(mut self, field: impl Into<String>, boost: f32) -> Self {
        self.boosts.insert(field.into(), boost);
        self
    }

    /// Builder: set the result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Builder: request highlighting with the given markers
    pub fn with_highlight(mut self, markers: HighlightMarkers) -> Self {
        self.highlight = Some(markers);
        self
    }

    /// Boost for a field, defaulting to 1.0
    pub fn boost_for(&self, field: &str) -> f32 {
        self.boosts.get(field).copied().unwrap_or(1.0)
    }
}

// ============================================================================
// MirrorHit
// ============================================================================

/// A ranked document returned by the mirror engine
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorHit {
    /// Identifier shared with the source record
    pub id: RecordId,
    /// Engine-relative relevance score
    pub score: f32,
    /// Field -> marked-up text, present when highlighting was requested
    pub highlights: BTreeMap<String, String>,
}

// ============================================================================
// MirrorEngine
// ============================================================================

/// Client interface to the mirror search engine
///
/// Implementations must be Send + Sync: one client is shared process-wide
/// for the lifetime of the synchronizer.
///
/// # Failure model
///
/// Whole-engine unreachability is an `Err(IndexUnavailable)`. Per-document
/// rejection inside an otherwise healthy batch is a failed
/// [`DocOutcome`]; a batch never aborts wholesale on one bad document.
pub trait MirrorEngine: Send + Sync {
    /// Name for debugging and logging
    fn name(&self) -> &str;

    /// Whether the engine is currently reachable
    fn is_available(&self) -> bool;

    /// Upsert a batch of documents, replacing same-id documents.
    ///
    /// Returns one outcome per input document, in order.
    fn put_batch(&self, docs: Vec<MirrorDocument>) -> Result<Vec<DocOutcome>>;

    /// Delete a document; deleting an absent document is not an error.
    fn delete(&self, id: RecordId) -> Result<()>;

    /// Ranked search with the engine's own relevance model.
    fn search(&self, query: &MirrorQuery) -> Result<Vec<MirrorHit>>;

    /// The engine's own (edit-distance based) term suggester.
    fn suggest(&self, term: &str, limit: usize) -> Result<Vec<Suggestion>>;
}
