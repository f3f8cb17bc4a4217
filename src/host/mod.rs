//! Host platform ports.
//!
//! The compiler core never reaches for globals: every capability it needs
//! from the surrounding platform (clock, site facts, record stores, value
//! formatting) is declared as a trait here and injected through
//! [`HostServices`]. The in-memory implementation in [`memory`] backs the
//! CLI and the test suite.

pub mod clock;
pub mod memory;
pub mod settings;

pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::MemoryStore;
pub use settings::{load_settings, ReflectionSettings};

use crate::document::{Document, NodeId};
use crate::error::ReflectionResult;
use crate::expression::FunctionRegistry;
use crate::model::{Entry, FieldInfo, ReflectionConfig, Section};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Ambient facts about the hosting site, rendered into the `params` block
/// of every context document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    pub root_url: String,
    pub http_host: String,
    /// Configured upload ceiling, in bytes.
    pub max_upload_size: u64,
    /// Version string of the hosting platform.
    pub platform_version: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "Reflection".to_string(),
            root_url: "http://localhost".to_string(),
            http_host: "localhost".to_string(),
            max_upload_size: 5_242_880,
            platform_version: "4.0.0".to_string(),
        }
    }
}

/// Limits imposed by the hosting process environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnvironmentLimits {
    /// Upload ceiling imposed by the environment, in bytes.
    pub upload_limit: u64,
}

impl Default for EnvironmentLimits {
    fn default() -> Self {
        Self {
            upload_limit: 8_388_608,
        }
    }
}

/// Read access to sections.
pub trait SectionStore: Send + Sync {
    fn sections(&self) -> Vec<Section>;
    fn section(&self, id: u64) -> Option<Section>;
    fn section_by_handle(&self, handle: &str) -> Option<Section>;
}

/// Read/write access to entries.
pub trait EntryStore: Send + Sync {
    fn entries(&self, section_id: u64) -> Vec<Entry>;
    fn entry(&self, id: u64) -> Option<Entry>;
    /// Write one computed value back into an entry's field storage.
    fn write_value(&self, entry_id: u64, field_id: u64, value: &str) -> ReflectionResult<()>;
    /// Counts of entries in other sections associated with this entry,
    /// as (section id, count) pairs.
    fn associated_counts(&self, entry_id: u64) -> Vec<(u64, u64)>;
}

/// Read access to persisted reflection field configuration.
pub trait ReflectionConfigStore: Send + Sync {
    /// All configuration rows for fields of the given tag owned by a section.
    fn configs_for_section(&self, section_id: u64, tag: &str) -> Vec<ReflectionConfig>;
}

/// Renders one field's stored value into the entry node of a context
/// document. Field types own their formatted representation; the default
/// emits `<handle>value</handle>`.
pub trait FieldElementFormatter: Send + Sync {
    fn append_formatted(&self, doc: &mut Document, parent: NodeId, field: &FieldInfo, value: &str);
}

/// Default field rendering: element named after the field handle.
#[derive(Debug, Default)]
pub struct DefaultFieldFormatter;

impl FieldElementFormatter for DefaultFieldFormatter {
    fn append_formatted(&self, doc: &mut Document, parent: NodeId, field: &FieldInfo, value: &str) {
        doc.add_text_element(parent, &field.handle, value);
    }
}

/// Post-evaluation text formatter applied before write-back.
pub trait ValueFormatter: Send + Sync {
    fn format(&self, value: &str) -> String;
}

/// Name -> formatter registry. An unknown formatter reference degrades to
/// pass-through (logged at debug).
#[derive(Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, Arc<dyn ValueFormatter>>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, formatter: Arc<dyn ValueFormatter>) {
        self.formatters.insert(name.to_string(), formatter);
    }

    /// Apply the named formatter, or return the value unchanged when the
    /// name is absent or unknown.
    pub fn apply(&self, name: Option<&str>, value: &str) -> String {
        match name {
            Some(name) => match self.formatters.get(name) {
                Some(formatter) => formatter.format(value),
                None => {
                    log::debug!("formatter '{}' not registered, passing through", name);
                    value.to_string()
                }
            },
            None => value.to_string(),
        }
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.formatters.keys().collect();
        names.sort();
        f.debug_struct("FormatterRegistry")
            .field("formatters", &names)
            .finish()
    }
}

/// Everything the pipeline needs from the host, bundled for injection.
pub struct HostServices {
    pub clock: Arc<dyn Clock>,
    pub site: SiteInfo,
    pub environment: EnvironmentLimits,
    pub sections: Arc<dyn SectionStore>,
    pub entries: Arc<dyn EntryStore>,
    pub configs: Arc<dyn ReflectionConfigStore>,
    pub field_formatter: Arc<dyn FieldElementFormatter>,
    pub value_formatters: FormatterRegistry,
    /// Host functions expressions may call.
    pub functions: FunctionRegistry,
    /// Element name of the entry node in context documents.
    pub entry_handle: String,
    /// Sandboxed base directory for stylesheet references.
    pub stylesheet_dir: PathBuf,
}

impl HostServices {
    /// The upload limit exposed to expressions: the smaller of the
    /// environment ceiling and the configured site ceiling.
    pub fn effective_upload_limit(&self) -> u64 {
        self.environment.upload_limit.min(self.site.max_upload_size)
    }
}
