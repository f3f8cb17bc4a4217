//! Stylesheet transform stage.
//!
//! An optional, declarative rewrite of the context document before
//! expression evaluation. The stage is deliberately forgiving: a missing
//! reference, a reference escaping the sandbox, an unreadable or malformed
//! stylesheet, or a failing rule all degrade to the untransformed document.
//! Degradation is a contract of this stage, not an error path.

pub mod stage;
pub mod stylesheet;

pub use stage::TransformStage;
pub use stylesheet::{Rule, Stylesheet};
