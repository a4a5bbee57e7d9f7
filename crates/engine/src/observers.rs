//! Post-write observers for the catalog write path
//!
//! Replaces implicit signal dispatch with an explicit, ordered list of
//! callbacks the catalog invokes synchronously after every commit. The
//! built-in observers keep the primary index, the vocabulary and
//! (optionally) the mirror in step with every record write.

use std::sync::Arc;
use tracing::warn;
use vintry_core::schema::CatalogSchema;
use vintry_core::{Record, RecordId};
use vintry_index::{build_vector, PrimaryIndex, Vocabulary};
use vintry_mirror::MirrorSynchronizer;

/// Callback invoked synchronously after a record commit
///
/// Observers run in registration order on the writer's thread; the write
/// is considered done only after every observer returns. Observers must
/// not fail the write: degraded paths (mirror down, malformed field)
/// are handled internally and logged.
pub trait RecordObserver: Send + Sync {
    /// Name for debugging and logging
    fn name(&self) -> &str;

    /// Called after a record is created or updated
    fn on_record_saved(&self, record: &Record);

    /// Called after a record is deleted
    fn on_record_deleted(&self, id: RecordId);
}

// ============================================================================
// Built-in observers
// ============================================================================

/// Rebuilds the record's search vector and upserts the primary index
pub struct PrimaryIndexObserver {
    schema: Arc<CatalogSchema>,
    index: Arc<PrimaryIndex>,
}

impl PrimaryIndexObserver {
    /// Create an observer over a shared index
    pub fn new(schema: Arc<CatalogSchema>, index: Arc<PrimaryIndex>) -> Self {
        PrimaryIndexObserver { schema, index }
    }
}

impl RecordObserver for PrimaryIndexObserver {
    fn name(&self) -> &str {
        "primary-index"
    }

    fn on_record_saved(&self, record: &Record) {
        // Malformed fields produce an empty vector inside build_vector;
        // the record still indexes (as unmatchable) and the write stands
        let vector = build_vector(record, &self.schema);
        self.index.index(record.id, vector, record.attrs.clone());
    }

    fn on_record_deleted(&self, id: RecordId) {
        self.index.remove(&id);
    }
}

/// Feeds every saved record's terms into the vocabulary
pub struct VocabularyObserver {
    vocab: Arc<Vocabulary>,
}

impl VocabularyObserver {
    /// Create an observer over a shared vocabulary
    pub fn new(vocab: Arc<Vocabulary>) -> Self {
        VocabularyObserver { vocab }
    }
}

impl RecordObserver for VocabularyObserver {
    fn name(&self) -> &str {
        "vocabulary"
    }

    fn on_record_saved(&self, record: &Record) {
        self.vocab.ingest(record);
    }

    fn on_record_deleted(&self, _id: RecordId) {
        // Vocabulary is append-only: terms are never pruned on delete
    }
}

/// Pushes saved records through the mirror synchronizer
pub struct MirrorObserver {
    sync: Arc<MirrorSynchronizer>,
}

impl MirrorObserver {
    /// Create an observer over a shared synchronizer
    pub fn new(sync: Arc<MirrorSynchronizer>) -> Self {
        MirrorObserver { sync }
    }
}

impl RecordObserver for MirrorObserver {
    fn name(&self) -> &str {
        "mirror"
    }

    fn on_record_saved(&self, record: &Record) {
        // Unavailability parks the id for resync inside the
        // synchronizer; a per-document rejection is logged and dropped.
        // Neither may fail the record write
        if let Err(err) = self.sync.upsert(record) {
            warn!(record_id = %record.id, error = %err, "mirror rejected record on write path");
        }
    }

    fn on_record_deleted(&self, id: RecordId) {
        if let Err(err) = self.sync.delete(id) {
            warn!(record_id = %id, error = %err, "mirror delete failed on write path");
        }
    }
}
