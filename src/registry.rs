//! Per-cycle field compilation registry.
//!
//! Caches reflection field configuration for the duration of one
//! compilation cycle (one entry's save event). The batch driver clears it
//! after every entry so each entry is compiled against current
//! configuration and current associated counts instead of a cycle-stale
//! snapshot.

use crate::host::ReflectionConfigStore;
use crate::model::{ReflectionConfig, Section};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CompilationRegistry {
    fields: HashMap<u64, ReflectionConfig>,
}

impl CompilationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the configuration for a field id.
    pub fn register(&mut self, config: ReflectionConfig) {
        self.fields.insert(config.field_id, config);
    }

    /// The registered configurations, or a fresh fetch from the store when
    /// the registry is empty. Fetched configurations are cached until the
    /// next [`clear`](Self::clear).
    pub fn fields_for(
        &mut self,
        section: &Section,
        tag: &str,
        store: &dyn ReflectionConfigStore,
    ) -> Vec<ReflectionConfig> {
        if self.fields.is_empty() {
            for config in store.configs_for_section(section.id, tag) {
                self.register(config);
            }
        }
        self.registered()
    }

    /// Currently registered configurations, in field-id order.
    pub fn registered(&self) -> Vec<ReflectionConfig> {
        let mut configs: Vec<_> = self.fields.values().cloned().collect();
        configs.sort_by_key(|c| c.field_id);
        configs
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }
}
