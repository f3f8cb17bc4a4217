//! Reflection field engine.
//!
//! Computes field values from other values of the same entry: each
//! reflection field holds a path expression which is evaluated against an
//! XML-shaped context document describing the entry and its environment,
//! optionally rewritten by a declarative stylesheet first, and the result
//! is written back into entry storage whenever the entry is saved.
//!
//! The crate is organised around a small set of host ports
//! ([`host::HostServices`]) so the same pipeline drives both live save
//! events ([`events`]) and batch recompilation ([`recompile`]).

pub mod compiler;
pub mod document;
pub mod error;
pub mod events;
pub mod expression;
pub mod host;
pub mod lifecycle;
pub mod model;
pub mod recompile;
pub mod registry;
pub mod transform;

pub use compiler::{CompileReport, CompileState, FieldCompiler};
pub use error::{ReflectionError, ReflectionResult};
pub use events::{EntryEvent, EventBus, ReflectionHandler, SaveContext, SaveHandler};
pub use recompile::{RecompileDriver, RecompileOptions, RecompileReport};
pub use registry::CompilationRegistry;
