//! The catalog: record store plus orchestrated search surfaces
//!
//! `Catalog` owns the records and wires the write path: every save runs
//! the ordered observer list synchronously (vector rebuild, primary
//! index upsert, vocabulary ingestion, optional mirror push) before the
//! write is considered done, so primary-index queries observe their own
//! writes. The mirror stays eventually consistent and nothing blocks on
//! its convergence.
//!
//! Entry points mirror the external interface: `save`/`remove` for the
//! write hook, `query` with a backend selector, `suggest` with a source
//! selector, and `reindex_mirror` for end-to-end mirror rebuilds.

use crate::observers::{
    MirrorObserver, PrimaryIndexObserver, RecordObserver, VocabularyObserver,
};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use vintry_core::schema::CatalogSchema;
use vintry_core::{
    BulkReport, Error, HighlightMarkers, QueryHit, QueryRequest, QueryResponse, QuerySource,
    QueryStats, Record, RecordId, Result, SuggestRequest, SuggestSource, Suggestion,
};
use vintry_index::{highlight, PrimaryIndex, Vocabulary};
use vintry_mirror::{MirrorEngine, MirrorQuery, MirrorSynchronizer, RetryPolicy};

// ============================================================================
// CatalogBuilder
// ============================================================================

/// Builder for [`Catalog`]
///
/// The mirror engine client is handed in once here and shared for the
/// catalog's lifetime; it is never reinitialized mid-process.
pub struct CatalogBuilder {
    schema: CatalogSchema,
    mirror_engine: Option<Arc<dyn MirrorEngine>>,
    retry: RetryPolicy,
    batch_size: usize,
    mirror_on_write: bool,
    extra_observers: Vec<Arc<dyn RecordObserver>>,
}

impl CatalogBuilder {
    fn new(schema: CatalogSchema) -> Self {
        CatalogBuilder {
            schema,
            mirror_engine: None,
            retry: RetryPolicy::default(),
            batch_size: vintry_mirror::DEFAULT_BATCH_SIZE,
            mirror_on_write: true,
            extra_observers: Vec::new(),
        }
    }

    /// Attach a mirror engine client
    pub fn with_mirror(mut self, engine: Arc<dyn MirrorEngine>) -> Self {
        self.mirror_engine = Some(engine);
        self
    }

    /// Retry policy for mirror writes
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Batch size for bulk mirror reindexing
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Whether saves push to the mirror synchronously (default true).
    ///
    /// Disable when the embedding application queues mirror updates
    /// itself; `reindex_mirror` and `flush_pending_mirror` still work.
    pub fn mirror_on_write(mut self, enabled: bool) -> Self {
        self.mirror_on_write = enabled;
        self
    }

    /// Register an additional observer, invoked after the built-ins
    pub fn with_observer(mut self, observer: Arc<dyn RecordObserver>) -> Self {
        self.extra_observers.push(observer);
        self
    }

    /// Finalize the catalog
    pub fn build(self) -> Catalog {
        let schema = Arc::new(self.schema);
        let primary = Arc::new(PrimaryIndex::new(schema.clone()));
        let vocab = Arc::new(Vocabulary::new());
        let mirror = self.mirror_engine.map(|engine| {
            Arc::new(
                MirrorSynchronizer::new(engine)
                    .with_retry_policy(self.retry)
                    .with_batch_size(self.batch_size),
            )
        });

        let mut observers: Vec<Arc<dyn RecordObserver>> = vec![
            Arc::new(PrimaryIndexObserver::new(schema.clone(), primary.clone())),
            Arc::new(VocabularyObserver::new(vocab.clone())),
        ];
        if self.mirror_on_write {
            if let Some(sync) = &mirror {
                observers.push(Arc::new(MirrorObserver::new(sync.clone())));
            }
        }
        observers.extend(self.extra_observers);

        Catalog {
            schema,
            records: DashMap::new(),
            primary,
            vocab,
            mirror,
            observers,
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Record store with an embedded search index and an optional mirror
pub struct Catalog {
    schema: Arc<CatalogSchema>,
    records: DashMap<RecordId, Record>,
    primary: Arc<PrimaryIndex>,
    vocab: Arc<Vocabulary>,
    mirror: Option<Arc<MirrorSynchronizer>>,
    observers: Vec<Arc<dyn RecordObserver>>,
}

impl Catalog {
    /// Start building a catalog for the given schema
    pub fn builder(schema: CatalogSchema) -> CatalogBuilder {
        CatalogBuilder::new(schema)
    }

    /// Create a catalog with no mirror and default settings
    pub fn new(schema: CatalogSchema) -> Self {
        Self::builder(schema).build()
    }

    // ========================================================================
    // Write hook
    // ========================================================================

    /// Commit a record, then run every post-write observer in order.
    ///
    /// Vector rebuild, primary-index upsert and vocabulary ingestion
    /// complete before this returns, so primary queries observe the
    /// write. Mirror propagation runs last and degrades (retry, then
    /// pending-resync) without failing the save.
    pub fn save(&self, record: Record) {
        debug!(record_id = %record.id, "saving record");
        self.records.insert(record.id, record.clone());
        for observer in &self.observers {
            observer.on_record_saved(&record);
        }
    }

    /// Delete a record and propagate the deletion through observers.
    pub fn remove(&self, id: &RecordId) -> Result<Record> {
        let (_, record) = self
            .records
            .remove(id)
            .ok_or(Error::RecordNotFound(*id))?;
        for observer in &self.observers {
            observer.on_record_deleted(*id);
        }
        Ok(record)
    }

    /// Fetch a record by id
    pub fn get(&self, id: &RecordId) -> Option<Record> {
        self.records.get(id).map(|r| r.clone())
    }

    /// Number of records in the catalog
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the catalog holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // ========================================================================
    // Query entry point
    // ========================================================================

    /// Ranked query against the selected backend.
    ///
    /// Filters are validated against the schema on both paths; an
    /// undeclared filter field is a validation error, never silently
    /// ignored.
    pub fn query(&self, req: &QueryRequest) -> Result<QueryResponse> {
        let start = Instant::now();
        match req.source {
            QuerySource::Primary => self.query_primary(req, start),
            QuerySource::Mirror => self.query_mirror(req, start),
        }
    }

    fn query_primary(&self, req: &QueryRequest, start: Instant) -> Result<QueryResponse> {
        let ranked = self.primary.query(&req.text, &req.filters, req.limit)?;
        let hits = ranked
            .hits
            .into_iter()
            .enumerate()
            .map(|(i, scored)| {
                let mut hit = QueryHit::new(scored.id, scored.score, (i + 1) as u32);
                if let Some(markers) = &req.highlight {
                    hit.highlights = self.highlight_record(&scored.id, &req.text, markers);
                }
                hit
            })
            .collect();

        Ok(QueryResponse {
            hits,
            stats: QueryStats::new(
                start.elapsed().as_micros() as u64,
                ranked.candidates,
                QuerySource::Primary,
            ),
        })
    }

    fn query_mirror(&self, req: &QueryRequest, start: Instant) -> Result<QueryResponse> {
        for field in req.filters.keys() {
            if !self.schema.is_filter_field(field) {
                return Err(Error::UnknownFilterField {
                    field: field.clone(),
                });
            }
        }
        let sync = self.mirror_sync()?;

        let mut mirror_query = MirrorQuery::new(req.text.clone()).with_limit(req.limit);
        for (field, value) in &req.filters {
            mirror_query = mirror_query.with_filter(field.clone(), value.clone());
        }
        // Index-time boosting is disallowed on the mirror: the schema
        // tiers are re-specified on every query
        for (field, tier) in self.schema.text_fields() {
            mirror_query = mirror_query.with_boost(field, self.schema.boost(tier));
        }
        if let Some(markers) = &req.highlight {
            mirror_query = mirror_query.with_highlight(markers.clone());
        }

        let mirror_hits = sync.query(&mirror_query)?;
        let candidates = mirror_hits.len();
        let hits = mirror_hits
            .into_iter()
            .enumerate()
            .map(|(i, hit)| QueryHit {
                id: hit.id,
                score: hit.score,
                rank: (i + 1) as u32,
                highlights: hit.highlights,
            })
            .collect();

        Ok(QueryResponse {
            hits,
            stats: QueryStats::new(
                start.elapsed().as_micros() as u64,
                candidates,
                QuerySource::Mirror,
            ),
        })
    }

    /// Highlight every schema text field of a record for a query.
    fn highlight_record(
        &self,
        id: &RecordId,
        query_text: &str,
        markers: &HighlightMarkers,
    ) -> BTreeMap<String, String> {
        let Some(record) = self.records.get(id) else {
            return BTreeMap::new();
        };
        let mut out = BTreeMap::new();
        for (field, _) in self.schema.text_fields() {
            if let Some(text) = record.field(field) {
                out.insert(
                    field.to_string(),
                    highlight(text, [query_text], &markers.start, &markers.end),
                );
            }
        }
        out
    }

    // ========================================================================
    // Suggestion entry point
    // ========================================================================

    /// Ranked term suggestions from the selected source.
    ///
    /// The vocabulary and the mirror use different algorithms (trigram
    /// Jaccard vs. edit distance) and are not required to agree.
    pub fn suggest(&self, req: &SuggestRequest) -> Result<Vec<Suggestion>> {
        match req.source {
            SuggestSource::Vocabulary => {
                Ok(self.vocab.suggest(&req.term, req.min_similarity, req.limit))
            }
            SuggestSource::Mirror => self.mirror_sync()?.term_suggest(&req.term, req.limit),
        }
    }

    // ========================================================================
    // Mirror maintenance
    // ========================================================================

    /// Rebuild the mirror index from every record in the store.
    ///
    /// Streams records through the synchronizer in batches and reports
    /// per-record failures without discarding successes.
    pub fn reindex_mirror(&self) -> Result<BulkReport> {
        let sync = self.mirror_sync()?;
        info!(records = self.records.len(), "starting bulk mirror reindex");
        let report = sync.bulk_upsert(self.records.iter().map(|entry| entry.value().clone()));
        Ok(report)
    }

    /// Retry every record parked as pending-resync.
    pub fn flush_pending_mirror(&self) -> Result<BulkReport> {
        let sync = self.mirror_sync()?;
        Ok(sync.flush_pending(|id| self.get(id)))
    }

    fn mirror_sync(&self) -> Result<&Arc<MirrorSynchronizer>> {
        self.mirror
            .as_ref()
            .ok_or_else(|| Error::InvalidQuery("no mirror index configured".to_string()))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The catalog's schema
    pub fn schema(&self) -> &CatalogSchema {
        &self.schema
    }

    /// The embedded primary index
    pub fn primary_index(&self) -> Arc<PrimaryIndex> {
        self.primary.clone()
    }

    /// The suggestion vocabulary
    pub fn vocabulary(&self) -> Arc<Vocabulary> {
        self.vocab.clone()
    }

    /// The mirror synchronizer, when configured
    pub fn mirror(&self) -> Option<Arc<MirrorSynchronizer>> {
        self.mirror.clone()
    }
}
