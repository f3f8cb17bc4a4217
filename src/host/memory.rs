//! In-memory host store.
//!
//! Backs the CLI and the test suite: sections, entries, reflection
//! configuration rows and associated-count data, loadable from a JSON
//! fixture file.

use super::{EntryStore, ReflectionConfigStore, SectionStore};
use crate::error::{ReflectionError, ReflectionResult};
use crate::model::{Entry, ReflectionConfig, Section, REFLECTION_TAG};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;

/// One associated-count fact: `count` entries of `section_id` are linked to
/// `entry_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociatedCount {
    pub entry_id: u64,
    pub section_id: u64,
    pub count: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    entries: Vec<Entry>,
    #[serde(default)]
    reflection_fields: Vec<ReflectionConfig>,
    #[serde(default)]
    associated_counts: Vec<AssociatedCount>,
}

/// Mutex-guarded in-memory record store implementing all store ports.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store from a JSON fixture file.
    pub fn from_fixture_file(path: &Path) -> ReflectionResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ReflectionError::Storage(format!("cannot read data file {}: {}", path.display(), e))
        })?;
        let data: StoreData = serde_json::from_str(&raw)?;
        Ok(Self {
            inner: Mutex::new(data),
        })
    }

    pub fn add_section(&self, section: Section) {
        self.inner.lock().unwrap().sections.push(section);
    }

    pub fn add_entry(&self, entry: Entry) {
        self.inner.lock().unwrap().entries.push(entry);
    }

    pub fn add_reflection_config(&self, config: ReflectionConfig) {
        self.inner.lock().unwrap().reflection_fields.push(config);
    }

    pub fn add_associated_count(&self, fact: AssociatedCount) {
        self.inner.lock().unwrap().associated_counts.push(fact);
    }
}

impl SectionStore for MemoryStore {
    fn sections(&self) -> Vec<Section> {
        self.inner.lock().unwrap().sections.clone()
    }

    fn section(&self, id: u64) -> Option<Section> {
        self.inner
            .lock()
            .unwrap()
            .sections
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    fn section_by_handle(&self, handle: &str) -> Option<Section> {
        self.inner
            .lock()
            .unwrap()
            .sections
            .iter()
            .find(|s| s.handle == handle)
            .cloned()
    }
}

impl EntryStore for MemoryStore {
    fn entries(&self, section_id: u64) -> Vec<Entry> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.section_id == section_id)
            .cloned()
            .collect()
    }

    fn entry(&self, id: u64) -> Option<Entry> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    fn write_value(&self, entry_id: u64, field_id: u64, value: &str) -> ReflectionResult<()> {
        let mut data = self.inner.lock().unwrap();
        let entry = data
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| {
                ReflectionError::Storage(format!("entry {} does not exist", entry_id))
            })?;
        entry.set_value(field_id, value);
        Ok(())
    }

    fn associated_counts(&self, entry_id: u64) -> Vec<(u64, u64)> {
        self.inner
            .lock()
            .unwrap()
            .associated_counts
            .iter()
            .filter(|a| a.entry_id == entry_id)
            .map(|a| (a.section_id, a.count))
            .collect()
    }
}

impl ReflectionConfigStore for MemoryStore {
    fn configs_for_section(&self, section_id: u64, tag: &str) -> Vec<ReflectionConfig> {
        if tag != REFLECTION_TAG {
            return Vec::new();
        }
        let data = self.inner.lock().unwrap();
        let Some(section) = data.sections.iter().find(|s| s.id == section_id) else {
            return Vec::new();
        };
        data.reflection_fields
            .iter()
            .filter(|cfg| section.field(cfg.field_id).is_some())
            .cloned()
            .collect()
    }
}
