//! Data-file lifecycle: install, upgrade and uninstall.
//!
//! Configuration rows persist as JSON and older files predate some of the
//! current columns. Upgrades are additive rewrites of the raw rows: a row
//! saved by version 1.0 gains `xslt_file` (null) at 1.1 and
//! `fetch_associated_counts` ("no") at 1.2, so every row deserializes into
//! the current [`ReflectionConfig`](crate::model::ReflectionConfig) shape
//! afterwards.

use crate::error::{ReflectionError, ReflectionResult};
use serde_json::Value;
use std::cmp::Ordering;
use std::path::Path;

/// Compare two dotted version strings numerically, segment by segment.
/// Missing segments count as zero, so `"1.1" == "1.1.0"`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|seg| seg.trim().parse::<u64>().unwrap_or(0))
            .collect()
    };
    let (a, b) = (parse(a), parse(b));
    for i in 0..a.len().max(b.len()) {
        let (x, y) = (
            a.get(i).copied().unwrap_or(0),
            b.get(i).copied().unwrap_or(0),
        );
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn is_older_than(previous: &str, threshold: &str) -> bool {
    compare_versions(previous, threshold) == Ordering::Less
}

/// Manages the reflection portion of a host data file.
pub struct Lifecycle<'a> {
    data_path: &'a Path,
}

impl<'a> Lifecycle<'a> {
    pub fn new(data_path: &'a Path) -> Self {
        Self { data_path }
    }

    fn read(&self) -> ReflectionResult<Value> {
        let raw = std::fs::read_to_string(self.data_path).map_err(|e| {
            ReflectionError::Storage(format!(
                "cannot read data file {}: {}",
                self.data_path.display(),
                e
            ))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write(&self, data: &Value) -> ReflectionResult<()> {
        let raw = serde_json::to_string_pretty(data)?;
        std::fs::write(self.data_path, raw).map_err(|e| {
            ReflectionError::Storage(format!(
                "cannot write data file {}: {}",
                self.data_path.display(),
                e
            ))
        })
    }

    /// Create the data file with an empty configuration table, or ensure
    /// the table exists in a file that is already present.
    pub fn install(&self) -> ReflectionResult<()> {
        let mut data = if self.data_path.exists() {
            self.read()?
        } else {
            Value::Object(serde_json::Map::new())
        };
        let Some(map) = data.as_object_mut() else {
            return Err(ReflectionError::Storage(format!(
                "data file {} is not a JSON object",
                self.data_path.display()
            )));
        };
        map.entry("reflection_fields")
            .or_insert_with(|| Value::Array(Vec::new()));
        self.write(&data)
    }

    /// Remove all reflection configuration from the data file. Host-owned
    /// tables (sections, entries) are left untouched.
    pub fn uninstall(&self) -> ReflectionResult<()> {
        if !self.data_path.exists() {
            return Ok(());
        }
        let mut data = self.read()?;
        if let Some(map) = data.as_object_mut() {
            map.remove("reflection_fields");
        }
        self.write(&data)
    }

    /// Bring rows written by `previous_version` up to the current shape.
    pub fn upgrade(&self, previous_version: &str) -> ReflectionResult<()> {
        let mut data = self.read()?;
        let Some(rows) = data
            .get_mut("reflection_fields")
            .and_then(Value::as_array_mut)
        else {
            return Ok(());
        };

        let needs_xslt = is_older_than(previous_version, "1.1");
        let needs_counts = is_older_than(previous_version, "1.2");
        for row in rows.iter_mut() {
            let Some(row) = row.as_object_mut() else {
                continue;
            };
            if needs_xslt {
                row.entry("xslt_file").or_insert(Value::Null);
            }
            if needs_counts {
                row.entry("fetch_associated_counts")
                    .or_insert_with(|| Value::String("no".to_string()));
            }
        }
        self.write(&data)
    }
}
