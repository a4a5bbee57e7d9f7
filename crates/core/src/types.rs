//! Core types for the vintry catalog
//!
//! This module defines the foundational types:
//! - RecordId: Opaque, stable identifier for catalog records
//! - AttrValue: Typed non-text attribute used for equality filters
//! - Record: The searchable entity owned by the primary store

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Opaque, stable identifier for a catalog record
///
/// A RecordId is a wrapper around a UUID v4. The same identifier addresses
/// the record in the primary store and its projection in the mirror index.
/// RecordIds are totally ordered so that score ties can be broken
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Create a new random RecordId using UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a RecordId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Parse a RecordId from a string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }

    /// Get the raw bytes of this RecordId
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed non-text attribute value
///
/// Attributes participate in search only as hard equality filters.
/// Different types are NEVER equal, even when they contain the same
/// "value": `Int(1) != Float(1.0)`. Float equality follows IEEE-754
/// semantics: `NaN != NaN`, `-0.0 == 0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttrValue {
    /// Categorical label
    Str(String),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// Boolean flag
    Bool(bool),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (AttrValue::Float(a), AttrValue::Float(b)) => a == b,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            // Different types are never equal
            _ => false,
        }
    }
}

impl AttrValue {
    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Str(_) => "Str",
            AttrValue::Int(_) => "Int",
            AttrValue::Float(_) => "Float",
            AttrValue::Bool(_) => "Bool",
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// The searchable catalog entity
///
/// A Record carries named nullable text fields (the searchable surface)
/// and named non-text attributes (equality-filter surface). Records are
/// created and updated by upstream CRUD operations; the search core only
/// derives data from them and never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier, shared with the mirror projection
    pub id: RecordId,
    /// Named text fields; None models a NULL column
    pub fields: BTreeMap<String, Option<String>>,
    /// Named filterable attributes
    pub attrs: BTreeMap<String, AttrValue>,
}

impl Record {
    /// Create an empty record with the given identifier
    pub fn new(id: RecordId) -> Self {
        Record {
            id,
            fields: BTreeMap::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder: set a text field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    /// Builder: set a text field to NULL
    pub fn with_null_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// Builder: set a filterable attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Get a text field's value, treating NULL and absent alike
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_deref())
    }

    /// Get a filterable attribute
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}
