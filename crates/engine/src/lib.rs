//! Orchestration layer for the vintry catalog-search engine
//!
//! This crate wires the search core together:
//! - `Catalog`: record store, synchronous write-path hooks, and the
//!   query / suggestion / bulk-reindex entry points
//! - `RecordObserver`: the explicit, ordered post-write callback list
//!
//! Everything a consumer needs is re-exported here; the root `vintry`
//! package re-exports this crate in turn.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod observers;

pub use catalog::{Catalog, CatalogBuilder};
pub use observers::{
    MirrorObserver, PrimaryIndexObserver, RecordObserver, VocabularyObserver,
};

// Re-export the crates a consumer composes with
pub use vintry_core::schema::{CatalogSchema, SchemaBuilder, WeightTier};
pub use vintry_core::{
    AttrValue, BulkReport, DocOutcome, Error, HighlightMarkers, QueryHit, QueryRequest,
    QueryResponse, QuerySource, QueryStats, Record, RecordId, Result, SuggestRequest,
    SuggestSource, Suggestion,
};
pub use vintry_index::{
    build_vector, highlight, PrimaryIndex, SearchVector, TermEntry, Vocabulary,
};
pub use vintry_mirror::{
    InMemoryMirrorEngine, MirrorDocument, MirrorEngine, MirrorHit, MirrorQuery,
    MirrorSynchronizer, RetryPolicy,
};
