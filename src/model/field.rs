//! Persisted reflection field configuration.

use serde::{Deserialize, Serialize};

/// A yes/no flag, persisted as the strings `"yes"` / `"no"`.
///
/// The persisted configuration store predates this crate and uses enum
/// columns rather than booleans; the serialized form is kept for
/// compatibility with existing stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Yes,
    #[default]
    No,
}

impl Toggle {
    pub fn is_yes(self) -> bool {
        matches!(self, Toggle::Yes)
    }
}

impl std::fmt::Display for Toggle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Toggle::Yes => write!(f, "yes"),
            Toggle::No => write!(f, "no"),
        }
    }
}

/// Configuration row for one reflection field.
///
/// `expression` and `xslt_file` are independently optional: a field may
/// transform without extracting, extract without transforming, or neither.
/// `xslt_file` and `fetch_associated_counts` were added by the 1.1 and 1.2
/// store migrations respectively, so both carry serde defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReflectionConfig {
    pub id: u64,
    /// Owning field in the host section schema.
    pub field_id: u64,
    /// Stylesheet reference, resolved against the sandboxed stylesheet
    /// directory at compile time.
    #[serde(default)]
    pub xslt_file: Option<String>,
    /// Path expression evaluated against the (possibly transformed)
    /// context document.
    #[serde(default)]
    pub expression: Option<String>,
    /// Named formatter applied to the evaluated value before write-back.
    #[serde(default)]
    pub formatter: Option<String>,
    /// When yes, a manually entered value wins over the computed one.
    #[serde(rename = "override", default)]
    pub override_manual: Toggle,
    /// When yes, the field is hidden from the host's output surface.
    /// Carried for the host; the compiler itself does not consult it.
    #[serde(default)]
    pub hide: Toggle,
    /// When yes, the context document carries associated entry counts.
    #[serde(default)]
    pub fetch_associated_counts: Toggle,
}

impl ReflectionConfig {
    /// Minimal configuration: extract with an expression, no transform.
    pub fn with_expression(id: u64, field_id: u64, expression: &str) -> Self {
        Self {
            id,
            field_id,
            xslt_file: None,
            expression: Some(expression.to_string()),
            formatter: None,
            override_manual: Toggle::No,
            hide: Toggle::No,
            fetch_associated_counts: Toggle::No,
        }
    }
}
