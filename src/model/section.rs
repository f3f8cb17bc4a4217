//! Sections and their field schemas.

use serde::{Deserialize, Serialize};

/// A field owned by a section. The reflection configuration for a field
/// lives in the reflection config store, keyed by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldInfo {
    pub id: u64,
    /// Stable slug used as the element name for the field's formatted value.
    pub handle: String,
    pub label: String,
}

/// A named group of entries sharing a field schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    pub id: u64,
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
}

impl Section {
    pub fn field(&self, field_id: u64) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.id == field_id)
    }
}
