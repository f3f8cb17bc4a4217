//! Typed entry-save event bus.
//!
//! The host fires one of four event kinds whenever an entry is saved; the
//! reflection handler responds by compiling every reflection field
//! registered for the current cycle. Handlers are registered explicitly
//! and invoked in registration order; the only ordering requirement on
//! callers is that the compilation registry is cleared after each entry.

use crate::compiler::FieldCompiler;
use crate::error::ReflectionResult;
use crate::host::HostServices;
use crate::model::{Entry, Section, REFLECTION_TAG};
use crate::registry::CompilationRegistry;
use std::sync::Arc;

/// The entry-save events the reflection pipeline subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryEvent {
    EntryCreated,
    EntryEdited,
    ImportEntryCreated,
    ImportEntryEdited,
}

impl EntryEvent {
    /// Import events assume the registry was populated by the importer;
    /// backend events populate it from the section on first use.
    pub fn is_import(self) -> bool {
        matches!(
            self,
            EntryEvent::ImportEntryCreated | EntryEvent::ImportEntryEdited
        )
    }
}

impl std::fmt::Display for EntryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryEvent::EntryCreated => write!(f, "entry-created"),
            EntryEvent::EntryEdited => write!(f, "entry-edited"),
            EntryEvent::ImportEntryCreated => write!(f, "import-entry-created"),
            EntryEvent::ImportEntryEdited => write!(f, "import-entry-edited"),
        }
    }
}

/// Payload delivered with every entry-save event.
pub struct SaveContext<'a> {
    pub section: &'a Section,
    pub entry: &'a Entry,
}

/// A subscriber to entry-save events. The compilation registry is owned by
/// the dispatching cycle and passed in explicitly, so its lifetime is
/// visible at every call site.
pub trait SaveHandler: Send + Sync {
    fn on_entry_saved(
        &self,
        event: EntryEvent,
        ctx: &SaveContext<'_>,
        registry: &mut CompilationRegistry,
    ) -> ReflectionResult<()>;
}

/// Explicit-registration event bus, dispatching in registration order.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Box<dyn SaveHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn SaveHandler>) {
        self.handlers.push(handler);
    }

    pub fn has_handlers(&self) -> bool {
        !self.handlers.is_empty()
    }

    pub fn dispatch(
        &self,
        event: EntryEvent,
        ctx: &SaveContext<'_>,
        registry: &mut CompilationRegistry,
    ) -> ReflectionResult<()> {
        for handler in &self.handlers {
            handler.on_entry_saved(event, ctx, registry)?;
        }
        Ok(())
    }
}

/// The reflection pipeline's subscriber: compiles every registered
/// reflection field for the saved entry. Per-field failures are reported
/// and do not stop sibling fields.
pub struct ReflectionHandler {
    host: Arc<HostServices>,
    compiler: FieldCompiler,
}

impl ReflectionHandler {
    pub fn new(host: Arc<HostServices>) -> Self {
        let compiler = FieldCompiler::new(host.clone());
        Self { host, compiler }
    }
}

impl SaveHandler for ReflectionHandler {
    fn on_entry_saved(
        &self,
        event: EntryEvent,
        ctx: &SaveContext<'_>,
        registry: &mut CompilationRegistry,
    ) -> ReflectionResult<()> {
        let configs = if event.is_import() {
            registry.registered()
        } else {
            registry.fields_for(ctx.section, REFLECTION_TAG, self.host.configs.as_ref())
        };

        for config in configs {
            // Re-read the entry so earlier write-backs in this cycle are
            // visible to later fields.
            let entry = self
                .host
                .entries
                .entry(ctx.entry.id)
                .unwrap_or_else(|| ctx.entry.clone());

            if let Err(e) = self.compiler.compile(&config, &entry) {
                log::error!(
                    "compiling field {} for entry {} ({} event) failed: {}",
                    config.field_id,
                    entry.id,
                    event,
                    e
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::FunctionRegistry;
    use crate::host::{
        DefaultFieldFormatter, EntryStore, EnvironmentLimits, FixedClock, FormatterRegistry,
        MemoryStore, SiteInfo,
    };
    use crate::model::{FieldInfo, ReflectionConfig};
    use chrono::{DateTime, TimeZone, Utc};
    use std::path::PathBuf;

    fn fixture() -> (Arc<MemoryStore>, Arc<HostServices>, Section) {
        let store = Arc::new(MemoryStore::new());
        let section = Section {
            id: 5,
            handle: "articles".into(),
            name: "Articles".into(),
            fields: vec![
                FieldInfo {
                    id: 11,
                    handle: "title".into(),
                    label: "Title".into(),
                },
                FieldInfo {
                    id: 12,
                    handle: "summary".into(),
                    label: "Summary".into(),
                },
                FieldInfo {
                    id: 13,
                    handle: "shout".into(),
                    label: "Shout".into(),
                },
            ],
        };
        store.add_section(section.clone());
        let created = Utc.with_ymd_and_hms(2021, 3, 1, 9, 30, 0).unwrap();
        let mut entry = Entry::new(42, 5, created);
        entry.set_value(11, "Hello");
        store.add_entry(entry);

        let instant = DateTime::parse_from_rfc3339("2021-03-01T09:30:00+01:00").unwrap();
        let host = Arc::new(HostServices {
            clock: Arc::new(FixedClock(instant)),
            site: SiteInfo::default(),
            environment: EnvironmentLimits::default(),
            sections: store.clone(),
            entries: store.clone(),
            configs: store.clone(),
            field_formatter: Arc::new(DefaultFieldFormatter),
            value_formatters: FormatterRegistry::new(),
            functions: FunctionRegistry::new(),
            entry_handle: "reflection-field".into(),
            stylesheet_dir: PathBuf::from("/nonexistent"),
        });
        (store, host, section)
    }

    #[test]
    fn backend_event_populates_registry_and_compiles() {
        let (store, host, section) = fixture();
        store.add_reflection_config(ReflectionConfig::with_expression(
            1,
            12,
            "/data/reflection-field/entry/title",
        ));

        let mut bus = EventBus::new();
        bus.register(Box::new(ReflectionHandler::new(host)));
        let mut registry = CompilationRegistry::new();
        let entry = store.entry(42).unwrap();
        let ctx = SaveContext {
            section: &section,
            entry: &entry,
        };
        bus.dispatch(EntryEvent::EntryEdited, &ctx, &mut registry).unwrap();

        assert_eq!(store.entry(42).unwrap().value(12), Some("Hello"));
        assert!(!registry.is_empty());
    }

    #[test]
    fn import_event_uses_only_preregistered_fields() {
        let (store, host, section) = fixture();
        store.add_reflection_config(ReflectionConfig::with_expression(
            1,
            12,
            "/data/reflection-field/entry/title",
        ));

        let mut bus = EventBus::new();
        bus.register(Box::new(ReflectionHandler::new(host)));
        let mut registry = CompilationRegistry::new();
        let entry = store.entry(42).unwrap();
        let ctx = SaveContext {
            section: &section,
            entry: &entry,
        };
        // Nothing registered: the import path must not populate from the
        // section behind the importer's back.
        bus.dispatch(EntryEvent::ImportEntryEdited, &ctx, &mut registry)
            .unwrap();
        assert_eq!(store.entry(42).unwrap().value(12), None);
    }

    #[test]
    fn one_bad_field_does_not_stop_siblings() {
        let (store, host, section) = fixture();
        store.add_reflection_config(ReflectionConfig::with_expression(1, 12, "/data/["));
        store.add_reflection_config(ReflectionConfig::with_expression(
            2,
            13,
            "/data/reflection-field/entry/title",
        ));

        let mut bus = EventBus::new();
        bus.register(Box::new(ReflectionHandler::new(host)));
        let mut registry = CompilationRegistry::new();
        let entry = store.entry(42).unwrap();
        let ctx = SaveContext {
            section: &section,
            entry: &entry,
        };
        bus.dispatch(EntryEvent::EntryEdited, &ctx, &mut registry).unwrap();

        assert_eq!(store.entry(42).unwrap().value(12), None);
        assert_eq!(store.entry(42).unwrap().value(13), Some("Hello"));
    }

    #[test]
    fn later_fields_observe_earlier_write_backs() {
        let (store, host, section) = fixture();
        store.add_reflection_config(ReflectionConfig::with_expression(
            1,
            12,
            "/data/reflection-field/entry/title",
        ));
        store.add_reflection_config(ReflectionConfig::with_expression(
            2,
            13,
            "concat(/data/reflection-field/entry/summary, '!')",
        ));

        let mut bus = EventBus::new();
        bus.register(Box::new(ReflectionHandler::new(host)));
        let mut registry = CompilationRegistry::new();
        let entry = store.entry(42).unwrap();
        let ctx = SaveContext {
            section: &section,
            entry: &entry,
        };
        bus.dispatch(EntryEvent::EntryCreated, &ctx, &mut registry).unwrap();

        assert_eq!(store.entry(42).unwrap().value(13), Some("Hello!"));
    }
}
