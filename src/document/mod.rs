//! Context documents.
//!
//! Every compilation assembles a fresh document from ambient parameters and
//! the target entry's data; the tree lives in [`node`] and the assembly
//! logic in [`builder`].

pub mod builder;
pub mod node;

pub use builder::{BuildOptions, ContextDocumentBuilder};
pub use node::{escape, Document, NodeId};
