//! Context document assembly.
//!
//! The document has exactly two top-level sections under the `data` root:
//! a `params` block of ambient facts and an entry node carrying section
//! metadata, formatted field values, optional associated-count attributes
//! and the entry's system dates. Construction is pure: nothing is written
//! anywhere, and the same inputs under a frozen clock produce a
//! byte-identical document.

use super::node::Document;
use crate::error::{ReflectionError, ReflectionResult};
use crate::host::HostServices;
use crate::model::Entry;

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Element name for the entry node.
    pub entry_handle: String,
    /// Include per-associated-section count attributes on the entry element.
    pub fetch_associated_counts: bool,
}

impl BuildOptions {
    pub fn new(entry_handle: &str, fetch_associated_counts: bool) -> Self {
        Self {
            entry_handle: entry_handle.to_string(),
            fetch_associated_counts,
        }
    }
}

pub struct ContextDocumentBuilder<'h> {
    host: &'h HostServices,
}

impl<'h> ContextDocumentBuilder<'h> {
    pub fn new(host: &'h HostServices) -> Self {
        Self { host }
    }

    pub fn build(&self, entry: &Entry, options: &BuildOptions) -> ReflectionResult<Document> {
        let mut doc = Document::new("data");
        self.build_params(&mut doc);
        self.build_entry(&mut doc, entry, options)?;
        Ok(doc)
    }

    fn build_params(&self, doc: &mut Document) {
        let now = self.host.clock.now();
        let site = &self.host.site;
        let params = doc.add_element(doc.root(), "params");

        let upload_limit = self.host.effective_upload_limit().to_string();
        let pairs: [(&str, String); 12] = [
            ("today", now.format("%Y-%m-%d").to_string()),
            ("current-time", now.format("%H:%M").to_string()),
            ("this-year", now.format("%Y").to_string()),
            ("this-month", now.format("%m").to_string()),
            ("this-day", now.format("%d").to_string()),
            ("timezone", now.format("%:z").to_string()),
            ("website-name", site.name.clone()),
            ("root", site.root_url.clone()),
            ("workspace", format!("{}/workspace", site.root_url)),
            ("http-host", site.http_host.clone()),
            ("upload-limit", upload_limit),
            ("symphony-version", site.platform_version.clone()),
        ];

        for (name, value) in pairs {
            doc.add_text_element(params, name, &value);
        }
    }

    fn build_entry(
        &self,
        doc: &mut Document,
        entry: &Entry,
        options: &BuildOptions,
    ) -> ReflectionResult<()> {
        let section = self.host.sections.section(entry.section_id).ok_or_else(|| {
            ReflectionError::DocumentBuild(format!(
                "section {} for entry {} cannot be resolved",
                entry.section_id, entry.id
            ))
        })?;

        let field_node = doc.add_element(doc.root(), &options.entry_handle);

        let section_node = doc.add_text_element(field_node, "section", &section.name);
        doc.set_attribute(section_node, "id", &section.id.to_string());
        doc.set_attribute(section_node, "handle", &section.handle);

        let entry_node = doc.add_element(field_node, "entry");
        doc.set_attribute(entry_node, "id", &entry.id.to_string());

        if options.fetch_associated_counts {
            for (section_id, count) in self.host.entries.associated_counts(entry.id) {
                // An associated section that no longer resolves is skipped.
                match self.host.sections.section(section_id) {
                    Some(associated) => {
                        doc.set_attribute(entry_node, &associated.handle, &count.to_string());
                    }
                    None => {
                        log::debug!(
                            "associated section {} for entry {} cannot be resolved, skipping",
                            section_id,
                            entry.id
                        );
                    }
                }
            }
        }

        for (&field_id, value) in &entry.values {
            if value.is_empty() {
                continue;
            }
            match section.field(field_id) {
                Some(field) => {
                    self.host
                        .field_formatter
                        .append_formatted(doc, entry_node, field, value);
                }
                None => {
                    log::debug!(
                        "field {} on entry {} is not part of section '{}', skipping",
                        field_id,
                        entry.id,
                        section.handle
                    );
                }
            }
        }

        self.build_system_date(doc, entry, entry_node);
        Ok(())
    }

    fn build_system_date(
        &self,
        doc: &mut Document,
        entry: &Entry,
        parent: super::node::NodeId,
    ) {
        let system_date = doc.add_element(parent, "system-date");
        for (name, stamp) in [("created", entry.created), ("modified", entry.modified)] {
            let date = doc.add_text_element(system_date, name, &stamp.format("%Y-%m-%d").to_string());
            doc.set_attribute(date, "iso", &stamp.to_rfc3339());
            doc.set_attribute(date, "time", &stamp.format("%H:%M").to_string());
        }
    }
}
