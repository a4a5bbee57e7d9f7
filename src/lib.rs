//! Vintry - embedded catalog search with a mirrored external index
//!
//! Vintry gives a catalog of structured text records ranked free-text
//! search across weighted fields, match highlighting, and fuzzy term
//! suggestion, backed by two interchangeable strategies: an embedded
//! index maintained synchronously beside the record store, and a
//! mirrored external search-engine index kept eventually consistent.
//!
//! # Quick Start
//!
//! ```
//! use vintry::{Catalog, CatalogSchema, QueryRequest, Record, RecordId, WeightTier};
//!
//! let schema = CatalogSchema::builder()
//!     .text_field("variety", WeightTier::A)
//!     .text_field("winery", WeightTier::B)
//!     .text_field("description", WeightTier::D)
//!     .filter_field("country")
//!     .build();
//! let catalog = Catalog::new(schema);
//!
//! catalog.save(
//!     Record::new(RecordId::new())
//!         .with_field("variety", "Merlot")
//!         .with_field("description", "earthy and bold")
//!         .with_attr("country", "US"),
//! );
//!
//! let response = catalog.query(&QueryRequest::new("merlot")).unwrap();
//! assert_eq!(response.hits.len(), 1);
//! ```
//!
//! # Architecture
//!
//! The write path is synchronous: saving a record rebuilds its search
//! vector, upserts the embedded index and ingests the vocabulary before
//! the save returns, so queries observe their own writes. Mirror
//! propagation runs through the same ordered observer list but degrades
//! gracefully (bounded retries, then pending-resync) without ever
//! failing a write.

// Re-export the public API from vintry-engine
pub use vintry_engine::*;
