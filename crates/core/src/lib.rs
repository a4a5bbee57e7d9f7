//! Core types for the vintry catalog-search engine
//!
//! This crate defines the foundational types used throughout the system:
//! - RecordId: Opaque, stable identifier for catalog records
//! - Record / AttrValue: The searchable entity and its filter attributes
//! - CatalogSchema / WeightTier: Weighted-field declaration
//! - QueryRequest / QueryResponse: The query surface shared by backends
//! - SuggestRequest / Suggestion: The fuzzy-suggestion surface
//! - BulkReport / DocOutcome: Partial-failure accounting for bulk sync
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query_types;
pub mod schema;
pub mod sync_types;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{Error, Result};
pub use query_types::{
    HighlightMarkers, QueryHit, QueryRequest, QueryResponse, QuerySource, QueryStats,
    SuggestRequest, SuggestSource, Suggestion, DEFAULT_MIN_SIMILARITY,
};
pub use schema::{CatalogSchema, SchemaBuilder, WeightTier, DEFAULT_TIER_BOOSTS, MAX_FIELD_LEN};
pub use sync_types::{BulkReport, DocOutcome};
pub use types::{AttrValue, Record, RecordId};
