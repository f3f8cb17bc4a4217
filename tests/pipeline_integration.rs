//! Full pipeline behavior through live save events.

mod common;

use common::{frozen_host, seeded_store, wired_driver};
use reflection::host::{EntryStore, MemoryStore, SectionStore};
use reflection::model::{ReflectionConfig, Toggle};
use reflection::recompile::RecompileOptions;
use reflection::{CompilationRegistry, EntryEvent, EventBus, ReflectionHandler, SaveContext};
use std::sync::Arc;

fn save_entry(store: &Arc<MemoryStore>, host: Arc<reflection::host::HostServices>, entry_id: u64) {
    let mut bus = EventBus::new();
    bus.register(Box::new(ReflectionHandler::new(host)));
    let entry = store.entry(entry_id).unwrap();
    let section = store.section(entry.section_id).unwrap();
    let mut registry = CompilationRegistry::new();
    bus.dispatch(
        EntryEvent::EntryEdited,
        &SaveContext {
            section: &section,
            entry: &entry,
        },
        &mut registry,
    )
    .unwrap();
}

#[test]
fn live_save_compiles_reflection_fields() {
    let store = seeded_store();
    let dir = tempfile::tempdir().unwrap();
    let host = frozen_host(store.clone(), dir.path());

    save_entry(&store, host, 42);
    assert_eq!(store.entry(42).unwrap().value(12), Some("Hello"));
    // The sibling entry was not touched.
    assert_eq!(store.entry(43).unwrap().value(12), None);
}

#[test]
fn override_field_keeps_a_manually_entered_value() {
    let store = seeded_store();
    store.write_value(42, 12, "Keep me").unwrap();
    let mut config = ReflectionConfig::with_expression(9, 12, "/data/reflection-field/entry/title");
    config.override_manual = Toggle::Yes;
    store.add_reflection_config(config);

    let dir = tempfile::tempdir().unwrap();
    save_entry(&store, frozen_host(store.clone(), dir.path()), 42);
    assert_eq!(store.entry(42).unwrap().value(12), Some("Keep me"));
}

#[test]
fn stylesheet_rewrites_the_context_before_evaluation() {
    let store = seeded_store();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("headline.json"),
        r#"{"rules": [{"select": "//entry/title", "element": "headline"}]}"#,
    )
    .unwrap();

    let mut config = ReflectionConfig::with_expression(9, 12, "/data/headline");
    config.xslt_file = Some("headline.json".into());
    store.add_reflection_config(config);

    save_entry(&store, frozen_host(store.clone(), dir.path()), 42);
    assert_eq!(store.entry(42).unwrap().value(12), Some("Hello"));
}

#[test]
fn escaping_stylesheet_reference_degrades_to_pass_through() {
    let store = seeded_store();
    let dir = tempfile::tempdir().unwrap();

    let mut config = ReflectionConfig::with_expression(9, 12, "/data/reflection-field/entry/title");
    config.xslt_file = Some("../../../etc/passwd".into());
    store.add_reflection_config(config);

    save_entry(&store, frozen_host(store.clone(), dir.path()), 42);
    // The untransformed document still carries the entry node.
    assert_eq!(store.entry(42).unwrap().value(12), Some("Hello"));
}

#[test]
fn params_are_rendered_from_the_frozen_clock() {
    let store = seeded_store();
    store.add_reflection_config(ReflectionConfig::with_expression(
        9,
        12,
        "concat(/data/params/today, 'T', /data/params/current-time)",
    ));

    let dir = tempfile::tempdir().unwrap();
    save_entry(&store, frozen_host(store.clone(), dir.path()), 42);
    assert_eq!(
        store.entry(42).unwrap().value(12),
        Some("2021-03-01T09:30")
    );
}

#[test]
fn recompiling_twice_under_a_frozen_clock_is_idempotent() {
    let store = seeded_store();
    let dir = tempfile::tempdir().unwrap();
    let driver = wired_driver(frozen_host(store.clone(), dir.path()));
    let options = RecompileOptions {
        sections: Some("articles".into()),
        verbosity: 0,
    };

    driver.run(&options).unwrap();
    let first = store.entry(42).unwrap().value(12).map(str::to_string);
    driver.run(&options).unwrap();
    let second = store.entry(42).unwrap().value(12).map(str::to_string);
    assert_eq!(first, second);
}
