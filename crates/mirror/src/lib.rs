//! Mirror index synchronization for the vintry catalog
//!
//! This crate provides the second backing strategy: a denormalized,
//! independently queryable index in an external search engine, kept
//! eventually consistent with the primary record store.
//!
//! - `document`: MirrorDocument projection (one per record)
//! - `engine`: the MirrorEngine client trait and typed MirrorQuery
//! - `memory`: InMemoryMirrorEngine, the embedded default engine
//! - `sync`: MirrorSynchronizer with retrying writes, pending resync,
//!   batched bulk reindex with partial-failure accounting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod engine;
pub mod memory;
pub mod sync;

pub use document::MirrorDocument;
pub use engine::{MirrorEngine, MirrorHit, MirrorQuery};
pub use memory::{InMemoryMirrorEngine, DEFAULT_MAX_DOCUMENT_BYTES};
pub use sync::{MirrorSynchronizer, RetryPolicy, DEFAULT_BATCH_SIZE};
