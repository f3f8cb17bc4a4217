//! CLI/host settings file.
//!
//! Loaded at startup from a JSON file (path argument, `REFLECTION_CONFIG`
//! environment variable, or the default location). A missing file yields
//! defaults; a malformed file is an error.

use super::{EnvironmentLimits, SiteInfo};
use crate::error::ReflectionResult;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SETTINGS_PATH: &str = "config/reflection.json";

/// Default element name of the entry node in context documents.
pub const DEFAULT_ENTRY_HANDLE: &str = "reflection-field";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectionSettings {
    /// JSON fixture holding sections, entries and reflection configuration.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Sandboxed base directory for stylesheet references.
    #[serde(default = "default_stylesheet_dir")]
    pub stylesheet_dir: PathBuf,
    #[serde(default = "default_entry_handle")]
    pub entry_handle: String,
    #[serde(default)]
    pub site: SiteInfo,
    #[serde(default)]
    pub environment: EnvironmentLimits,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/reflection_data.json")
}

fn default_stylesheet_dir() -> PathBuf {
    PathBuf::from("workspace/utilities")
}

fn default_entry_handle() -> String {
    DEFAULT_ENTRY_HANDLE.to_string()
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            stylesheet_dir: default_stylesheet_dir(),
            entry_handle: default_entry_handle(),
            site: SiteInfo::default(),
            environment: EnvironmentLimits::default(),
        }
    }
}

/// Load settings from the given path or from the `REFLECTION_CONFIG`
/// environment variable. A missing file returns defaults.
pub fn load_settings(path: Option<&str>) -> ReflectionResult<ReflectionSettings> {
    let settings_path = path
        .map(|p| p.to_string())
        .or_else(|| std::env::var("REFLECTION_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string());

    match std::fs::read_to_string(&settings_path) {
        Ok(raw) => {
            let settings: ReflectionSettings = serde_json::from_str(&raw).map_err(|e| {
                log::error!("failed to parse settings file {}: {}", settings_path, e);
                e
            })?;
            Ok(settings)
        }
        Err(_) => Ok(ReflectionSettings::default()),
    }
}
