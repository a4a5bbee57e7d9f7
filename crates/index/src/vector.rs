//! Search vector construction from weighted record fields
//!
//! A SearchVector is the derived, per-record structure the primary index
//! ranks against: normalized term → (field-weight-adjusted frequency,
//! token positions). It is always reconstructible deterministically from
//! the record's current field values and the schema, and is never
//! hand-edited.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use tracing::warn;
use vintry_analysis::tokenizer::tokenize_tokens;
use vintry_core::schema::{CatalogSchema, MAX_FIELD_LEN};
use vintry_core::Record;

/// Position offset between fields.
///
/// Each field's token positions are offset by a per-field base so
/// positions from different fields never collide in the merged vector.
/// A field capped at MAX_FIELD_LEN bytes can never produce this many
/// surface words.
pub const FIELD_POSITION_STRIDE: u32 = 1 << 20;

/// Weight and positions for one term of a vector
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TermEntry {
    /// Sum over fields containing the term of tier boost x term frequency
    pub weight: f32,
    /// Stride-offset token positions across all fields
    pub positions: SmallVec<[u32; 4]>,
}

/// Derived per-record term-weight structure
///
/// Terms are held in a BTreeMap so iteration order, and therefore every
/// downstream accumulation, is canonical: building twice from unchanged
/// field values yields identical vectors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchVector {
    terms: BTreeMap<String, TermEntry>,
    norm: f32,
    token_count: u32,
}

impl SearchVector {
    /// The empty vector (also the malformed-input fallback)
    pub fn empty() -> Self {
        SearchVector::default()
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the vector has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Entry for a term, if present
    pub fn get(&self, term: &str) -> Option<&TermEntry> {
        self.terms.get(term)
    }

    /// Weight of a term, 0.0 when absent
    pub fn weight(&self, term: &str) -> f32 {
        self.terms.get(term).map(|e| e.weight).unwrap_or(0.0)
    }

    /// L2 norm over term weights, used for length normalization
    pub fn norm(&self) -> f32 {
        self.norm
    }

    /// Total tokens indexed across all fields
    pub fn token_count(&self) -> u32 {
        self.token_count
    }

    /// Iterate terms with their entries, in term order
    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermEntry)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Whether a field value is outside what the tokenizer should see.
fn is_malformed(text: &str) -> bool {
    text.len() > MAX_FIELD_LEN || text.contains('\0')
}

/// Build a record's search vector under the given schema.
///
/// Each declared text field is tokenized independently; all fields' term
/// and position lists merge into one vector. A term appearing in several
/// weighted fields accumulates every field's contribution; this
/// additively increases its rank contribution by design.
///
/// Malformed input (oversized field, interior NUL) is a warning, not an
/// error: the result is an empty-but-valid vector so the record write
/// itself still succeeds.
pub fn build_vector(record: &Record, schema: &CatalogSchema) -> SearchVector {
    for (field, _) in schema.text_fields() {
        if let Some(text) = record.field(field) {
            if is_malformed(text) {
                warn!(
                    record_id = %record.id,
                    field,
                    "malformed field text, producing empty vector"
                );
                return SearchVector::empty();
            }
        }
    }

    let mut terms: BTreeMap<String, TermEntry> = BTreeMap::new();
    let mut token_count = 0u32;

    for (field_slot, (field, tier)) in schema.text_fields().enumerate() {
        let Some(text) = record.field(field) else {
            continue;
        };
        let boost = schema.boost(tier);
        let base = field_slot as u32 * FIELD_POSITION_STRIDE;

        for token in tokenize_tokens(text) {
            let entry = terms.entry(token.term).or_default();
            entry.weight += boost;
            entry.positions.push(base + token.position);
            token_count += 1;
        }
    }

    let norm = terms
        .values()
        .map(|e| e.weight * e.weight)
        .sum::<f32>()
        .sqrt();

    SearchVector {
        terms,
        norm,
        token_count,
    }
}
