//! Denormalized record projection shipped to the mirror engine
//!
//! A MirrorDocument carries all searchable and filterable fields of a
//! record and nothing derived: the mirror engine builds its own index
//! internally. One document per record, addressed by the same identifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vintry_core::{AttrValue, Record, RecordId};

/// Denormalized projection of a [`Record`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorDocument {
    /// Same identifier as the source record
    pub id: RecordId,
    /// Non-null searchable text fields
    pub fields: BTreeMap<String, String>,
    /// Filterable attributes
    pub attrs: BTreeMap<String, AttrValue>,
}

impl MirrorDocument {
    /// Project a record into its mirror document.
    ///
    /// NULL text fields are dropped; the mirror treats absent and NULL
    /// alike.
    pub fn from_record(record: &Record) -> Self {
        MirrorDocument {
            id: record.id,
            fields: record
                .fields
                .iter()
                .filter_map(|(name, value)| {
                    value.as_ref().map(|text| (name.clone(), text.clone()))
                })
                .collect(),
            attrs: record.attrs.clone(),
        }
    }

    /// Serialized payload size in bytes, as the wire would carry it.
    pub fn payload_bytes(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }
}
