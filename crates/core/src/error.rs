//! Error types for the vintry search core
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.
//!
//! Taxonomy:
//! - validation errors (`UnknownFilterField`, `InvalidQuery`) are surfaced
//!   to the caller and never retried automatically
//! - `IndexUnavailable` makes mirror queries fail fast; mirror writes
//!   retry with backoff and then fall back to the pending-resync set
//! - partial bulk failure is data ([`crate::sync_types::BulkReport`]),
//!   not an error
//! - vector-build problems are warnings producing an empty vector, never
//!   a failed write

use crate::types::RecordId;
use thiserror::Error;

/// Result type alias for vintry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the vintry search core
#[derive(Debug, Error)]
pub enum Error {
    /// A query filter referenced an attribute the schema does not declare
    #[error("unknown filter field: {field}")]
    UnknownFilterField {
        /// The offending filter field name
        field: String,
    },

    /// The query was structurally invalid (e.g. mirror query without a
    /// configured mirror)
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The mirror engine could not be reached
    #[error("mirror index unavailable: {0}")]
    IndexUnavailable(String),

    /// The mirror engine rejected a single document
    #[error("mirror rejected document {id}: {reason}")]
    DocumentRejected {
        /// Identifier of the rejected record
        id: RecordId,
        /// Engine-reported rejection reason
        reason: String,
    },

    /// Direct lookup of a record that does not exist
    #[error("record not found: {0}")]
    RecordNotFound(RecordId),
}
