//! Embedded search index for the vintry catalog
//!
//! This crate provides the primary (embedded) search path:
//! - `vector`: SearchVector construction from weighted record fields
//! - `store`: PrimaryIndex with posting lists, idempotent upsert, ranked
//!   queries with hard equality filters
//! - `highlight`: match highlighting over original field text
//! - `vocab`: append-only term vocabulary with trigram fuzzy suggestion
//!
//! The mirror path lives in `vintry-mirror`; both are orchestrated by
//! `vintry-engine`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod highlight;
pub mod store;
pub mod vector;
pub mod vocab;

pub use highlight::highlight;
pub use store::{Posting, PostingList, PrimaryIndex, Ranked, ScoredRecord};
pub use vector::{build_vector, SearchVector, TermEntry, FIELD_POSITION_STRIDE};
pub use vocab::{Vocabulary, SCAN_THRESHOLD};
