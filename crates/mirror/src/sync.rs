//! Mirror index synchronizer
//!
//! Keeps the mirror engine's denormalized index eventually consistent
//! with the primary record store:
//! - `upsert` pushes one record, retrying unavailability with bounded
//!   exponential backoff, then parking the id as pending-resync instead
//!   of failing the write
//! - `bulk_upsert` streams records in batches with partial-failure
//!   accounting; one bad record never aborts the stream
//! - `query` / `term_suggest` delegate to the engine and fail fast when
//!   it is unreachable (callers fall back to the primary index)
//!
//! The engine client is constructed once, shared behind an `Arc`, and
//! never reinitialized mid-process.

use crate::document::MirrorDocument;
use crate::engine::{MirrorEngine, MirrorHit, MirrorQuery};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vintry_core::{BulkReport, DocOutcome, Error, Record, RecordId, Result, Suggestion};

/// Default documents per mirror batch call
pub const DEFAULT_BATCH_SIZE: usize = 100;

// ============================================================================
// RetryPolicy
// ============================================================================

/// Bounded exponential backoff for mirror writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = fail immediately)
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        RetryPolicy {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        RetryPolicy {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Backoff delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

// ============================================================================
// MirrorSynchronizer
// ============================================================================

/// Pushes record projections to the mirror engine and tracks what could
/// not be delivered
pub struct MirrorSynchronizer {
    engine: Arc<dyn MirrorEngine>,
    retry: RetryPolicy,
    batch_size: usize,
    /// Records whose mirror write was parked after retry exhaustion
    pending: Mutex<BTreeSet<RecordId>>,
}

impl MirrorSynchronizer {
    /// Create a synchronizer over a shared engine client
    pub fn new(engine: Arc<dyn MirrorEngine>) -> Self {
        MirrorSynchronizer {
            engine,
            retry: RetryPolicy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            pending: Mutex::new(BTreeSet::new()),
        }
    }

    /// Builder: set the retry policy for mirror writes
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder: set the bulk batch size (resource bound, not correctness)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Name of the engine behind this synchronizer
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    // ========================================================================
    // Write path
    // ========================================================================

    /// Push one record to the mirror, replacing any same-id document.
    ///
    /// Unavailability is retried with backoff; when retries are
    /// exhausted the id is parked as pending-resync and `Ok(())` is
    /// returned; the overall record write must not fail because the
    /// mirror is down. A per-document rejection by a healthy engine is
    /// surfaced as [`Error::DocumentRejected`].
    pub fn upsert(&self, record: &Record) -> Result<()> {
        let doc = MirrorDocument::from_record(record);
        let id = doc.id;

        match self.send_with_retry(vec![doc]) {
            Ok(outcomes) => match outcomes.into_iter().next() {
                Some(DocOutcome {
                    error: Some(reason),
                    ..
                }) => Err(Error::DocumentRejected { id, reason }),
                _ => Ok(()),
            },
            Err(err) => {
                warn!(record_id = %id, error = %err, "mirror unreachable, parking record for resync");
                self.pending.lock().insert(id);
                Ok(())
            }
        }
    }

    /// Propagate a record deletion to the mirror.
    ///
    /// Same degraded-mode contract as `upsert`: after retry exhaustion
    /// the id is parked for resync.
    pub fn delete(&self, id: RecordId) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.engine.delete(id) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    if attempt >= self.retry.max_retries {
                        warn!(record_id = %id, error = %err, "mirror unreachable, parking delete for resync");
                        self.pending.lock().insert(id);
                        return Ok(());
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!(record_id = %id, attempt, ?delay, "mirror delete failed, backing off");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    /// Stream records to the mirror in batches, rebuilding it end-to-end.
    ///
    /// Never loads the whole record set at once and never aborts on a
    /// single record's failure; the report accounts for every streamed
    /// record. Upserts are idempotent per record, so rerunning from the
    /// start after an interruption is safe.
    pub fn bulk_upsert<I>(&self, records: I) -> BulkReport
    where
        I: IntoIterator<Item = Record>,
    {
        let mut report = BulkReport::new();
        let mut batch: Vec<MirrorDocument> = Vec::with_capacity(self.batch_size);

        for record in records {
            batch.push(MirrorDocument::from_record(&record));
            if batch.len() == self.batch_size {
                self.flush_batch(&mut batch, &mut report);
            }
        }
        if !batch.is_empty() {
            self.flush_batch(&mut batch, &mut report);
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "bulk mirror reindex finished"
        );
        report
    }

    fn flush_batch(&self, batch: &mut Vec<MirrorDocument>, report: &mut BulkReport) {
        let docs = std::mem::take(batch);
        let ids: Vec<RecordId> = docs.iter().map(|d| d.id).collect();
        debug!(batch_len = ids.len(), "flushing mirror batch");

        match self.send_with_retry(docs) {
            Ok(outcomes) => report.absorb(outcomes),
            Err(err) => {
                let reason = err.to_string();
                for id in ids {
                    report.record_failure(id, reason.clone());
                }
            }
        }
    }

    fn send_with_retry(&self, docs: Vec<MirrorDocument>) -> Result<Vec<DocOutcome>> {
        let mut attempt = 0;
        loop {
            match self.engine.put_batch(docs.clone()) {
                Ok(outcomes) => return Ok(outcomes),
                Err(err) => {
                    if attempt >= self.retry.max_retries {
                        return Err(err);
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!(attempt, ?delay, error = %err, "mirror batch failed, backing off");
                    std::thread::sleep(delay);
                    attempt += 1;
                }
            }
        }
    }

    // ========================================================================
    // Read path
    // ========================================================================

    /// Ranked search against the mirror engine's own relevance model.
    ///
    /// Fails fast on unavailability; the caller falls back to the
    /// primary index or reports degraded search.
    pub fn query(&self, query: &MirrorQuery) -> Result<Vec<MirrorHit>> {
        self.engine.search(query)
    }

    /// The mirror engine's own edit-distance suggester.
    pub fn term_suggest(&self, term: &str, limit: usize) -> Result<Vec<Suggestion>> {
        self.engine.suggest(term, limit)
    }

    // ========================================================================
    // Pending resync
    // ========================================================================

    /// Ids parked after retry exhaustion, in identifier order
    pub fn pending(&self) -> Vec<RecordId> {
        self.pending.lock().iter().copied().collect()
    }

    /// Whether any record awaits resync
    pub fn has_pending(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Drain the pending set against the current record store.
    ///
    /// `lookup` resolves an id to its current record; `None` means the
    /// record was deleted and its mirror document is removed instead.
    /// Ids that still cannot be delivered are parked again.
    pub fn flush_pending<F>(&self, lookup: F) -> BulkReport
    where
        F: Fn(&RecordId) -> Option<Record>,
    {
        let parked: Vec<RecordId> = {
            let mut guard = self.pending.lock();
            std::mem::take(&mut *guard).into_iter().collect()
        };

        let mut report = BulkReport::new();
        for id in parked {
            let sent = match lookup(&id) {
                Some(record) => {
                    self.send_with_retry(vec![MirrorDocument::from_record(&record)])
                }
                None => self.engine.delete(id).map(|()| vec![DocOutcome::ok(id)]),
            };
            match sent {
                Ok(outcomes) => report.absorb(outcomes),
                Err(err) => {
                    self.pending.lock().insert(id);
                    report.record_failure(id, err.to_string());
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryMirrorEngine;
    use vintry_core::AttrValue;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(1, Duration::from_millis(1))
    }

    fn engine_and_sync() -> (Arc<InMemoryMirrorEngine>, MirrorSynchronizer) {
        let engine = Arc::new(InMemoryMirrorEngine::new());
        let sync = MirrorSynchronizer::new(engine.clone()).with_retry_policy(fast_retry());
        (engine, sync)
    }

    fn record(text: &str) -> Record {
        Record::new(RecordId::new())
            .with_field("description", text)
            .with_attr("country", "US")
    }

    #[test]
    fn test_retry_policy_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        assert_eq!(policy.delay_for(0), Duration::from_millis(10));
        assert_eq!(policy.delay_for(1), Duration::from_millis(20));
        assert_eq!(policy.delay_for(2), Duration::from_millis(40));
    }

    #[test]
    fn test_upsert_reaches_engine() {
        let (engine, sync) = engine_and_sync();
        let rec = record("earthy and bold");
        sync.upsert(&rec).unwrap();
        assert!(engine.contains(&rec.id));
        assert!(!sync.has_pending());
    }

    #[test]
    fn test_upsert_parks_pending_when_unavailable() {
        let (engine, sync) = engine_and_sync();
        engine.set_available(false);

        let rec = record("earthy and bold");
        // The write itself must not fail
        sync.upsert(&rec).unwrap();
        assert!(!engine.contains(&rec.id));
        assert_eq!(sync.pending(), vec![rec.id]);
    }

    #[test]
    fn test_flush_pending_delivers_after_recovery() {
        let (engine, sync) = engine_and_sync();
        engine.set_available(false);

        let rec = record("earthy and bold");
        sync.upsert(&rec).unwrap();

        engine.set_available(true);
        let report = sync.flush_pending(|id| {
            if *id == rec.id {
                Some(rec.clone())
            } else {
                None
            }
        });

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);
        assert!(engine.contains(&rec.id));
        assert!(!sync.has_pending());
    }

    #[test]
    fn test_flush_pending_reparks_when_still_down() {
        let (engine, sync) = engine_and_sync();
        engine.set_available(false);

        let rec = record("earthy and bold");
        sync.upsert(&rec).unwrap();

        let report = sync.flush_pending(|_| Some(rec.clone()));
        assert_eq!(report.failed, 1);
        assert!(sync.has_pending());
    }

    #[test]
    fn test_flush_pending_deletes_missing_records() {
        let (engine, sync) = engine_and_sync();
        sync.upsert(&record("earthy")).unwrap();

        engine.set_available(false);
        let rec = record("bold");
        sync.upsert(&rec).unwrap();
        engine.set_available(true);

        // The record disappeared from the primary store meanwhile
        let report = sync.flush_pending(|_| None);
        assert_eq!(report.succeeded, 1);
        assert!(!engine.contains(&rec.id));
    }

    #[test]
    fn test_upsert_rejection_is_surfaced() {
        let engine = Arc::new(InMemoryMirrorEngine::new().with_max_document_bytes(64));
        let sync = MirrorSynchronizer::new(engine).with_retry_policy(RetryPolicy::none());

        let rec = record(&"x".repeat(1024));
        let err = sync.upsert(&rec).unwrap_err();
        assert!(matches!(err, Error::DocumentRejected { .. }));
        // Rejection is a document problem, not an availability problem
        assert!(!sync.has_pending());
    }

    #[test]
    fn test_bulk_upsert_counts_partial_failures() {
        let engine = Arc::new(InMemoryMirrorEngine::new().with_max_document_bytes(256));
        let sync = MirrorSynchronizer::new(engine.clone())
            .with_retry_policy(RetryPolicy::none())
            .with_batch_size(4);

        let mut records: Vec<Record> = (0..8).map(|i| record(&format!("wine {i}"))).collect();
        records.push(record(&"x".repeat(1024)));
        records.push(record(&"y".repeat(1024)));
        let failing: Vec<RecordId> = records[8..].iter().map(|r| r.id).collect();

        let report = sync.bulk_upsert(records);
        assert_eq!(report.succeeded, 8);
        assert_eq!(report.failed, 2);
        assert_eq!(report.total(), 10);
        let failed_ids: Vec<RecordId> = report.failures.iter().map(|(id, _)| *id).collect();
        assert_eq!(failed_ids, failing);

        // Successes are queryable
        let hits = sync.query(&MirrorQuery::new("wine").with_limit(20)).unwrap();
        assert_eq!(hits.len(), 8);
    }

    #[test]
    fn test_bulk_upsert_unavailable_fails_whole_stream_gracefully() {
        let (engine, sync) = engine_and_sync();
        engine.set_available(false);

        let records: Vec<Record> = (0..5).map(|i| record(&format!("wine {i}"))).collect();
        let report = sync.bulk_upsert(records);

        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 5);
    }

    #[test]
    fn test_bulk_upsert_is_rerunnable() {
        let (engine, sync) = engine_and_sync();
        let records: Vec<Record> = (0..6).map(|i| record(&format!("wine {i}"))).collect();

        let first = sync.bulk_upsert(records.clone());
        let second = sync.bulk_upsert(records);

        assert_eq!(first.succeeded, 6);
        assert_eq!(second.succeeded, 6);
        assert_eq!(engine.len(), 6);
    }

    #[test]
    fn test_query_fails_fast_when_unavailable() {
        let (engine, sync) = engine_and_sync();
        engine.set_available(false);

        let err = sync.query(&MirrorQuery::new("merlot")).unwrap_err();
        assert!(matches!(err, Error::IndexUnavailable(_)));
    }

    #[test]
    fn test_delete_propagates() {
        let (engine, sync) = engine_and_sync();
        let rec = record("earthy");
        sync.upsert(&rec).unwrap();
        sync.delete(rec.id).unwrap();
        assert!(!engine.contains(&rec.id));
    }

    #[test]
    fn test_filters_flow_through_query(){
        let (_, sync) = engine_and_sync();
        let rec = record("earthy merlot");
        sync.upsert(&rec).unwrap();

        let none = sync
            .query(&MirrorQuery::new("merlot").with_filter("country", "FR"))
            .unwrap();
        assert!(none.is_empty());

        let some = sync
            .query(&MirrorQuery::new("merlot").with_filter("country", AttrValue::from("US")))
            .unwrap();
        assert_eq!(some.len(), 1);
    }
}
