//! Catalog schema: weighted text fields and legal filter attributes
//!
//! The schema is declared once per catalog and drives:
//! - which record fields contribute to the search vector, at which tier
//! - which attribute names are legal in equality filters
//! - the per-field boosts re-sent to the mirror engine on every query

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on a single text field's byte length.
///
/// Fields beyond this are treated as malformed input: the vector builder
/// logs a warning and produces an empty-but-valid vector so the record
/// write itself still succeeds.
pub const MAX_FIELD_LEN: usize = 1 << 20;

/// Relevance tier for a text field
///
/// Four tiers ordered from highest to lowest boost. A term appearing in
/// several weighted fields accumulates every field's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WeightTier {
    /// Highest boost (e.g. the primary name field)
    A,
    /// Strong boost
    B,
    /// Moderate boost
    C,
    /// Baseline boost (e.g. long description text)
    D,
}

impl WeightTier {
    /// Index into the schema's boost table
    fn slot(self) -> usize {
        match self {
            WeightTier::A => 0,
            WeightTier::B => 1,
            WeightTier::C => 2,
            WeightTier::D => 3,
        }
    }
}

/// Default tier boosts, highest to lowest
pub const DEFAULT_TIER_BOOSTS: [f32; 4] = [10.0, 4.0, 2.0, 1.0];

/// Declared shape of a catalog: weighted text fields + filter attributes
///
/// Built once via [`CatalogSchema::builder`], then shared read-only.
///
/// # Example
///
/// ```
/// use vintry_core::schema::{CatalogSchema, WeightTier};
///
/// let schema = CatalogSchema::builder()
///     .text_field("variety", WeightTier::A)
///     .text_field("winery", WeightTier::B)
///     .text_field("description", WeightTier::D)
///     .filter_field("country")
///     .build();
///
/// assert_eq!(schema.tier("variety"), Some(WeightTier::A));
/// assert!(schema.is_filter_field("country"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSchema {
    text_fields: BTreeMap<String, WeightTier>,
    filter_fields: BTreeSet<String>,
    tier_boosts: [f32; 4],
}

impl CatalogSchema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            text_fields: BTreeMap::new(),
            filter_fields: BTreeSet::new(),
            tier_boosts: DEFAULT_TIER_BOOSTS,
        }
    }

    /// Iterate declared text fields with their tiers, in name order
    pub fn text_fields(&self) -> impl Iterator<Item = (&str, WeightTier)> {
        self.text_fields.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Tier of a declared text field
    pub fn tier(&self, field: &str) -> Option<WeightTier> {
        self.text_fields.get(field).copied()
    }

    /// Boost multiplier for a tier
    pub fn boost(&self, tier: WeightTier) -> f32 {
        self.tier_boosts[tier.slot()]
    }

    /// Boost multiplier for a declared text field
    pub fn field_boost(&self, field: &str) -> Option<f32> {
        self.tier(field).map(|t| self.boost(t))
    }

    /// Whether an attribute name is legal in equality filters
    pub fn is_filter_field(&self, field: &str) -> bool {
        self.filter_fields.contains(field)
    }

    /// Number of declared text fields
    pub fn text_field_count(&self) -> usize {
        self.text_fields.len()
    }
}

/// Builder for [`CatalogSchema`]
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    text_fields: BTreeMap<String, WeightTier>,
    filter_fields: BTreeSet<String>,
    tier_boosts: [f32; 4],
}

impl SchemaBuilder {
    /// Declare a searchable text field at the given tier
    pub fn text_field(mut self, name: impl Into<String>, tier: WeightTier) -> Self {
        self.text_fields.insert(name.into(), tier);
        self
    }

    /// Declare a legal filter attribute
    pub fn filter_field(mut self, name: impl Into<String>) -> Self {
        self.filter_fields.insert(name.into());
        self
    }

    /// Override the tier boost table (A, B, C, D)
    pub fn tier_boosts(mut self, boosts: [f32; 4]) -> Self {
        self.tier_boosts = boosts;
        self
    }

    /// Finalize the schema
    pub fn build(self) -> CatalogSchema {
        CatalogSchema {
            text_fields: self.text_fields,
            filter_fields: self.filter_fields,
            tier_boosts: self.tier_boosts,
        }
    }
}
