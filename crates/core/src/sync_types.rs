//! Types shared by the mirror synchronizer and its callers
//!
//! This module defines:
//! - DocOutcome: per-document result of a mirror batch call
//! - BulkReport: partial-failure accounting for bulk reindexing
//!
//! A bulk operation never aborts on a single document's failure; it
//! reports which identifiers failed without discarding successes.

use crate::types::RecordId;
use serde::{Deserialize, Serialize};

// ============================================================================
// DocOutcome
// ============================================================================

/// Per-document result of a mirror engine batch call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocOutcome {
    /// Identifier of the document
    pub id: RecordId,
    /// Engine-reported failure reason, None on success
    pub error: Option<String>,
}

impl DocOutcome {
    /// A successful outcome
    pub fn ok(id: RecordId) -> Self {
        DocOutcome { id, error: None }
    }

    /// A failed outcome with the engine's reason
    pub fn failed(id: RecordId, reason: impl Into<String>) -> Self {
        DocOutcome {
            id,
            error: Some(reason.into()),
        }
    }

    /// Whether the document was accepted
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ============================================================================
// BulkReport
// ============================================================================

/// Accounting for a bulk mirror operation
///
/// Invariant: `succeeded + failed` equals the number of records streamed,
/// and `failures.len() == failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Documents accepted by the mirror engine
    pub succeeded: usize,
    /// Documents rejected or lost to engine unavailability
    pub failed: usize,
    /// Identifier and reason for each failure
    pub failures: Vec<(RecordId, String)>,
}

impl BulkReport {
    /// Create an empty report
    pub fn new() -> Self {
        BulkReport::default()
    }

    /// Record a success
    pub fn record_success(&mut self) {
        self.succeeded += 1;
    }

    /// Record a failure with its reason
    pub fn record_failure(&mut self, id: RecordId, reason: impl Into<String>) {
        self.failed += 1;
        self.failures.push((id, reason.into()));
    }

    /// Fold a batch outcome list into the report
    pub fn absorb(&mut self, outcomes: Vec<DocOutcome>) {
        for outcome in outcomes {
            match outcome.error {
                None => self.record_success(),
                Some(reason) => self.record_failure(outcome.id, reason),
            }
        }
    }

    /// Total records accounted for
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Whether some but not all records failed
    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.succeeded > 0
    }
}
