//! Data model for sections, entries and reflection field configuration.

pub mod entry;
pub mod field;
pub mod section;

pub use entry::Entry;
pub use field::{ReflectionConfig, Toggle};
pub use section::{FieldInfo, Section};

/// The field tag reflection configuration rows are registered under.
pub const REFLECTION_TAG: &str = "reflection";
