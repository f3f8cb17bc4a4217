//! Entries: records belonging to a section.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single record with per-field values and system timestamps.
///
/// Values are kept in field-id order so document assembly and the computed
/// output are deterministic for a fixed entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: u64,
    pub section_id: u64,
    /// field id -> raw stored value
    #[serde(default)]
    pub values: BTreeMap<u64, String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Entry {
    pub fn new(id: u64, section_id: u64, created: DateTime<Utc>) -> Self {
        Self {
            id,
            section_id,
            values: BTreeMap::new(),
            created,
            modified: created,
        }
    }

    /// The stored value for a field, if present and non-empty.
    pub fn value(&self, field_id: u64) -> Option<&str> {
        self.values
            .get(&field_id)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn set_value(&mut self, field_id: u64, value: impl Into<String>) {
        self.values.insert(field_id, value.into());
    }
}
