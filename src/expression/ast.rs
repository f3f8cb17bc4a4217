//! Abstract syntax tree for path expressions.

/// A complete expression: a location path, a literal, or a function call.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(LocationPath),
    StringLiteral(String),
    NumberLiteral(f64),
    Call { name: String, args: Vec<Expr> },
}

/// A location path: optionally absolute, one step per path segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationPath {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// True for `//` steps: search the whole subtree, not just children.
    pub descendant: bool,
    pub test: NodeTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeTest {
    /// `name`: child elements with this name.
    Name(String),
    /// `*`: any child element.
    Wildcard,
    /// `@name`: an attribute of the context element.
    Attribute(String),
    /// `text()`: text children of the context element.
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[3]`: 1-based position within the matched set.
    Position(usize),
    /// `[path='literal']` / `[@attr='literal']`: string-value equality.
    Equals {
        path: LocationPath,
        literal: String,
    },
}
