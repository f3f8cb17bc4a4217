//! Path expression engine.
//!
//! Expressions select a scalar or node value out of a context document:
//! location paths (`/data/reflection-field/entry/title`), attribute steps
//! (`entry/@id`), predicates (`[2]`, `[@handle='articles']`), and function
//! calls (`concat(...)`, `count(...)`). Host-supplied functions can be
//! registered and invoked from inside an expression.

pub mod ast;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{Expr, LocationPath, NodeTest, Predicate, Step};
pub use evaluator::{Evaluator, NodeRef, Value};
pub use functions::{FunctionRegistry, HostFunction};
pub use parser::parse;
