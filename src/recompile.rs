//! Batch recompilation driver.
//!
//! Walks every entry of the selected sections and replays the entry-edited
//! event through the bus, so batch recompilation and a live save exercise
//! the exact same pipeline. Sections without reflection fields or without
//! entries are skipped with a warning; an unknown section handle aborts
//! the whole run before any entry is touched.

use crate::error::{ReflectionError, ReflectionResult};
use crate::events::{EntryEvent, EventBus, SaveContext};
use crate::host::HostServices;
use crate::model::{Section, REFLECTION_TAG};
use crate::registry::CompilationRegistry;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Per-section progress bars are only drawn at `-vvv` and above.
pub const PROGRESS_VERBOSITY_THRESHOLD: u8 = 3;

#[derive(Debug, Clone, Default)]
pub struct RecompileOptions {
    /// Comma-separated section handles, or `None` for every section.
    pub sections: Option<String>,
    pub verbosity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionStatus {
    Recompiled { entries: u64 },
    SkippedNoReflectionFields,
    SkippedNoEntries,
}

#[derive(Debug, Clone)]
pub struct SectionOutcome {
    pub handle: String,
    pub name: String,
    pub status: SectionStatus,
    /// Final position of the progress bar for this section; absent when
    /// verbosity kept the bar off or the section was skipped.
    pub progress_ticks: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct RecompileReport {
    pub outcomes: Vec<SectionOutcome>,
    pub entries_recompiled: u64,
}

pub struct RecompileDriver {
    host: Arc<HostServices>,
    bus: Option<Arc<EventBus>>,
}

impl RecompileDriver {
    pub fn new(host: Arc<HostServices>, bus: Option<Arc<EventBus>>) -> Self {
        Self { host, bus }
    }

    /// Resolve the requested handles eagerly: every handle must exist
    /// before any section is processed.
    fn resolve_sections(&self, requested: Option<&str>) -> ReflectionResult<Vec<Section>> {
        let Some(requested) = requested else {
            return Ok(self.host.sections.sections());
        };

        let mut sections = Vec::new();
        let mut seen = Vec::new();
        for handle in requested.split(',') {
            let handle = handle.trim();
            if handle.is_empty() || seen.contains(&handle) {
                continue;
            }
            seen.push(handle);
            match self.host.sections.section_by_handle(handle) {
                Some(section) => sections.push(section),
                None => {
                    return Err(ReflectionError::Validation(format!(
                        "section '{}' does not exist",
                        handle
                    )))
                }
            }
        }
        Ok(sections)
    }

    pub fn run(&self, options: &RecompileOptions) -> ReflectionResult<RecompileReport> {
        let bus = self
            .bus
            .as_ref()
            .filter(|bus| bus.has_handlers())
            .ok_or_else(|| {
                ReflectionError::Precondition(
                    "no entry-save handler is wired, recompilation would be a no-op".to_string(),
                )
            })?;

        let sections = self.resolve_sections(options.sections.as_deref())?;
        let mut report = RecompileReport::default();

        for section in sections {
            let configs = self
                .host
                .configs
                .configs_for_section(section.id, REFLECTION_TAG);
            if configs.is_empty() {
                log::warn!(
                    "section '{}' has no reflection fields, skipping",
                    section.handle
                );
                report.outcomes.push(SectionOutcome {
                    handle: section.handle.clone(),
                    name: section.name.clone(),
                    status: SectionStatus::SkippedNoReflectionFields,
                    progress_ticks: None,
                });
                continue;
            }

            let entries = self.host.entries.entries(section.id);
            if entries.is_empty() {
                log::warn!("section '{}' has no entries, skipping", section.handle);
                report.outcomes.push(SectionOutcome {
                    handle: section.handle.clone(),
                    name: section.name.clone(),
                    status: SectionStatus::SkippedNoEntries,
                    progress_ticks: None,
                });
                continue;
            }

            let progress = if options.verbosity >= PROGRESS_VERBOSITY_THRESHOLD {
                let bar = ProgressBar::new(entries.len() as u64);
                bar.set_style(
                    ProgressStyle::with_template("{bar:30} {pos}/{len} ({eta} remaining)")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                Some(bar)
            } else {
                None
            };

            let mut registry = CompilationRegistry::new();
            let mut recompiled = 0u64;
            for entry in &entries {
                let ctx = SaveContext {
                    section: &section,
                    entry,
                };
                bus.dispatch(EntryEvent::EntryEdited, &ctx, &mut registry)?;
                // Stale configuration must not leak into the next entry.
                registry.clear();
                recompiled += 1;
                if let Some(bar) = &progress {
                    bar.inc(1);
                }
            }
            let progress_ticks = progress.as_ref().map(ProgressBar::position);
            if let Some(bar) = progress {
                bar.finish_and_clear();
            }

            log::info!(
                "recompiled {} entr{} in section '{}'",
                recompiled,
                if recompiled == 1 { "y" } else { "ies" },
                section.handle
            );
            report.outcomes.push(SectionOutcome {
                handle: section.handle.clone(),
                name: section.name.clone(),
                status: SectionStatus::Recompiled {
                    entries: recompiled,
                },
                progress_ticks,
            });
            report.entries_recompiled += recompiled;
        }

        Ok(report)
    }
}
