//! Shared fixture for integration tests.

use chrono::{DateTime, TimeZone, Utc};
use reflection::expression::FunctionRegistry;
use reflection::host::{
    DefaultFieldFormatter, EnvironmentLimits, FixedClock, FormatterRegistry, HostServices,
    MemoryStore, SiteInfo,
};
use reflection::model::{Entry, FieldInfo, ReflectionConfig, Section};
use reflection::{EventBus, RecompileDriver, ReflectionHandler};
use std::path::Path;
use std::sync::Arc;

pub const FROZEN_INSTANT: &str = "2021-03-01T09:30:00+01:00";

/// Articles section (id 5) with title/summary fields and two entries, plus
/// a comments section (id 6) with no reflection fields and a notes section
/// (id 7) that is configured but has no entries.
pub fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store.add_section(Section {
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
        ],
    });
    store.add_section(Section {
        id: 6,
        handle: "comments".into(),
        name: "Comments".into(),
        fields: vec![FieldInfo {
            id: 21,
            handle: "body".into(),
            label: "Body".into(),
        }],
    });
    store.add_section(Section {
        id: 7,
        handle: "notes".into(),
        name: "Notes".into(),
        fields: vec![FieldInfo {
            id: 31,
            handle: "note".into(),
            label: "Note".into(),
        }],
    });

    let created = Utc.with_ymd_and_hms(2021, 3, 1, 9, 30, 0).unwrap();
    for (id, title) in [(42, "Hello"), (43, "World")] {
        let mut entry = Entry::new(id, 5, created);
        entry.set_value(11, title);
        store.add_entry(entry);
    }

    store.add_reflection_config(ReflectionConfig::with_expression(
        1,
        12,
        "/data/reflection-field/entry/title",
    ));
    store.add_reflection_config(ReflectionConfig::with_expression(
        2,
        31,
        "/data/params/today",
    ));
    Arc::new(store)
}

pub fn frozen_host(store: Arc<MemoryStore>, stylesheet_dir: &Path) -> Arc<HostServices> {
    let instant = DateTime::parse_from_rfc3339(FROZEN_INSTANT).unwrap();
    Arc::new(HostServices {
        clock: Arc::new(FixedClock(instant)),
        site: SiteInfo::default(),
        environment: EnvironmentLimits::default(),
        sections: store.clone(),
        entries: store.clone(),
        configs: store,
        field_formatter: Arc::new(DefaultFieldFormatter),
        value_formatters: FormatterRegistry::new(),
        functions: FunctionRegistry::new(),
        entry_handle: "reflection-field".into(),
        stylesheet_dir: stylesheet_dir.to_path_buf(),
    })
}

pub fn wired_driver(host: Arc<HostServices>) -> RecompileDriver {
    let mut bus = EventBus::new();
    bus.register(Box::new(ReflectionHandler::new(host.clone())));
    RecompileDriver::new(host, Some(Arc::new(bus)))
}
