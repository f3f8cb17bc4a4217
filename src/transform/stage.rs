//! Sandboxed stylesheet resolution and application.

use super::stylesheet::Stylesheet;
use crate::document::Document;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn separator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/+").unwrap())
}

fn parent_segment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(^|/)\.\./").unwrap())
}

/// Normalize a stylesheet reference so it cannot escape the base directory:
/// collapse repeated separators, strip `../` segments, drop a leading `/`.
pub fn sanitize_reference(reference: &str) -> String {
    let mut sanitized = separator_run().replace_all(reference, "/").into_owned();
    loop {
        let next = parent_segment().replace_all(&sanitized, "$1").into_owned();
        if next == sanitized {
            break;
        }
        sanitized = next;
    }
    sanitized.trim_start_matches('/').to_string()
}

/// Applies an optional stylesheet to a context document. All failure modes
/// degrade to the untransformed input.
#[derive(Debug, Clone)]
pub struct TransformStage {
    base_dir: PathBuf,
}

impl TransformStage {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
        }
    }

    /// The on-disk path a reference resolves to, always inside `base_dir`.
    pub fn resolve_reference(&self, reference: &str) -> PathBuf {
        self.base_dir.join(sanitize_reference(reference))
    }

    /// Transform `doc` through the referenced stylesheet. Returns `None`
    /// when the reference is absent, unresolvable or invalid, in which case
    /// the caller keeps the untransformed document.
    pub fn try_apply(&self, doc: &Document, reference: Option<&str>) -> Option<Document> {
        let reference = reference.filter(|r| !r.is_empty())?;

        let path = self.resolve_reference(reference);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                log::debug!(
                    "stylesheet '{}' not readable at {}, using untransformed document",
                    reference,
                    path.display()
                );
                return None;
            }
        };

        let stylesheet = match Stylesheet::from_json(&raw) {
            Ok(stylesheet) => stylesheet,
            Err(e) => {
                log::debug!("stylesheet '{}' is malformed ({}), using untransformed document", reference, e);
                return None;
            }
        };

        match stylesheet.apply(doc) {
            Ok(transformed) => Some(transformed),
            Err(e) => {
                log::debug!("stylesheet '{}' failed to apply ({}), using untransformed document", reference, e);
                None
            }
        }
    }

    /// Like [`try_apply`](Self::try_apply), degrading to a clone of the
    /// input on pass-through.
    pub fn apply(&self, doc: &Document, reference: Option<&str>) -> Document {
        self.try_apply(doc, reference)
            .unwrap_or_else(|| doc.clone())
    }
}
