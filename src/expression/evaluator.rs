//! Expression evaluation over a context document.

use super::ast::{Expr, LocationPath, NodeTest, Predicate};
use super::functions::FunctionRegistry;
use super::parser;
use crate::document::{Document, NodeId};
use crate::error::{ReflectionError, ReflectionResult};

/// Reference to a node produced by a path step. Attributes are not arena
/// nodes, so they are addressed as (element, attribute name) pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeRef {
    Node(NodeId),
    Attribute { element: NodeId, name: String },
}

/// Result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    Nodes(Vec<NodeRef>),
}

impl Value {
    /// String conversion: node-sets convert to the string-value of their
    /// first node (empty string for an empty set), numbers drop a trailing
    /// `.0` for integral values.
    pub fn string_value(&self, doc: &Document) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
            Value::Nodes(nodes) => nodes
                .first()
                .map(|node| node_string_value(doc, node))
                .unwrap_or_default(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn node_string_value(doc: &Document, node: &NodeRef) -> String {
    match node {
        NodeRef::Node(id) => doc.string_value(*id),
        NodeRef::Attribute { element, name } => doc
            .attribute(*element, name)
            .map(str::to_string)
            .unwrap_or_default(),
    }
}

/// Evaluation context: either the document itself (for absolute paths) or a
/// node inside it (for relative paths in predicates).
#[derive(Debug, Clone, Copy)]
enum Context {
    Document,
    Node(NodeId),
}

/// Evaluates parsed expressions against a document, dispatching named
/// function calls to builtins first and the injected host registry second.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    functions: FunctionRegistry,
}

impl Evaluator {
    pub fn new(functions: FunctionRegistry) -> Self {
        Self { functions }
    }

    /// Parse and evaluate `expression` against the document root.
    pub fn evaluate(&self, doc: &Document, expression: &str) -> ReflectionResult<Value> {
        let expr = parser::parse(expression)?;
        self.eval(doc, &expr, Context::Document)
    }

    fn eval(&self, doc: &Document, expr: &Expr, ctx: Context) -> ReflectionResult<Value> {
        match expr {
            Expr::StringLiteral(s) => Ok(Value::Text(s.clone())),
            Expr::NumberLiteral(n) => Ok(Value::Number(*n)),
            Expr::Path(path) => Ok(Value::Nodes(self.eval_path(doc, path, ctx)?)),
            Expr::Call { name, args } => self.eval_call(doc, name, args, ctx),
        }
    }

    fn eval_path(
        &self,
        doc: &Document,
        path: &LocationPath,
        ctx: Context,
    ) -> ReflectionResult<Vec<NodeRef>> {
        let mut current: Vec<Context> = if path.absolute {
            vec![Context::Document]
        } else {
            vec![ctx]
        };

        let mut result: Vec<NodeRef> = Vec::new();
        for (index, step) in path.steps.iter().enumerate() {
            let mut matched: Vec<NodeRef> = Vec::new();
            for context in &current {
                self.match_step(doc, step, *context, &mut matched);
            }

            for predicate in &step.predicates {
                matched = self.apply_predicate(doc, predicate, matched)?;
            }

            if index + 1 == path.steps.len() {
                result = matched;
            } else {
                // Only element nodes can have further steps applied.
                current = matched
                    .into_iter()
                    .filter_map(|node| match node {
                        NodeRef::Node(id) if doc.is_element(id) => Some(Context::Node(id)),
                        _ => None,
                    })
                    .collect();
            }
        }

        Ok(result)
    }

    fn match_step(&self, doc: &Document, step: &super::ast::Step, ctx: Context, out: &mut Vec<NodeRef>) {
        let context_elements: Vec<NodeId> = match ctx {
            Context::Document => {
                if step.descendant {
                    // The whole tree, root included, is in scope for `//`.
                    let mut all = vec![doc.root()];
                    all.extend(doc.descendants(doc.root()));
                    self.collect_matches(doc, step, &all, true, out);
                    return;
                }
                // The document's only child is the root element.
                self.collect_matches(doc, step, &[doc.root()], true, out);
                return;
            }
            Context::Node(id) => {
                // Attribute tests select from the context element itself
                // (descendant-or-self for `//@name`), not from its children.
                if matches!(step.test, NodeTest::Attribute(_)) {
                    let mut selves = vec![id];
                    if step.descendant {
                        selves.extend(doc.descendants(id));
                    }
                    self.collect_matches(doc, step, &selves, true, out);
                    return;
                }
                if step.descendant {
                    doc.descendants(id)
                } else {
                    doc.children(id).to_vec()
                }
            }
        };
        self.collect_matches(doc, step, &context_elements, false, out);
    }

    /// Apply the node test to `candidates`. `candidates_are_self` means the
    /// candidates are the nodes under test themselves (document context and
    /// attribute steps) rather than a child/descendant set.
    fn collect_matches(
        &self,
        doc: &Document,
        step: &super::ast::Step,
        candidates: &[NodeId],
        candidates_are_self: bool,
        out: &mut Vec<NodeRef>,
    ) {
        match &step.test {
            NodeTest::Name(name) => {
                for &id in candidates {
                    if doc.name(id) == Some(name.as_str()) {
                        out.push(NodeRef::Node(id));
                    }
                }
            }
            NodeTest::Wildcard => {
                for &id in candidates {
                    if doc.is_element(id) {
                        out.push(NodeRef::Node(id));
                    }
                }
            }
            NodeTest::Text => {
                if candidates_are_self {
                    return;
                }
                for &id in candidates {
                    if doc.is_text(id) {
                        out.push(NodeRef::Node(id));
                    }
                }
            }
            NodeTest::Attribute(name) => {
                if candidates_are_self {
                    for &id in candidates {
                        if doc.attribute(id, name).is_some() {
                            out.push(NodeRef::Attribute {
                                element: id,
                                name: name.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    fn apply_predicate(
        &self,
        doc: &Document,
        predicate: &Predicate,
        matched: Vec<NodeRef>,
    ) -> ReflectionResult<Vec<NodeRef>> {
        match predicate {
            Predicate::Position(position) => Ok(matched
                .into_iter()
                .nth(position - 1)
                .into_iter()
                .collect()),
            Predicate::Equals { path, literal } => {
                let mut kept = Vec::new();
                for node in matched {
                    let context = match &node {
                        NodeRef::Node(id) if doc.is_element(*id) => Context::Node(*id),
                        _ => continue,
                    };
                    let selected = self.eval_path(doc, path, context)?;
                    let any_equal = selected
                        .iter()
                        .any(|s| node_string_value(doc, s) == *literal);
                    if any_equal {
                        kept.push(node);
                    }
                }
                Ok(kept)
            }
        }
    }

    fn eval_call(
        &self,
        doc: &Document,
        name: &str,
        args: &[Expr],
        ctx: Context,
    ) -> ReflectionResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(doc, arg, ctx)?);
        }

        match name {
            "concat" => {
                let joined: String = values.iter().map(|v| v.string_value(doc)).collect();
                Ok(Value::Text(joined))
            }
            "count" => match values.as_slice() {
                [Value::Nodes(nodes)] => Ok(Value::Number(nodes.len() as f64)),
                _ => Err(ReflectionError::Expression(
                    "count() expects one node-set argument".to_string(),
                )),
            },
            "string" => match values.as_slice() {
                [value] => Ok(Value::Text(value.string_value(doc))),
                _ => Err(ReflectionError::Expression(
                    "string() expects one argument".to_string(),
                )),
            },
            "number" => match values.as_slice() {
                [value] => {
                    let text = value.string_value(doc);
                    let parsed: f64 = text.trim().parse().map_err(|_| {
                        ReflectionError::Expression(format!("number() cannot parse '{}'", text))
                    })?;
                    Ok(Value::Number(parsed))
                }
                _ => Err(ReflectionError::Expression(
                    "number() expects one argument".to_string(),
                )),
            },
            "normalize-space" => match values.as_slice() {
                [value] => {
                    let text = value.string_value(doc);
                    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                    Ok(Value::Text(collapsed))
                }
                _ => Err(ReflectionError::Expression(
                    "normalize-space() expects one argument".to_string(),
                )),
            },
            _ => self.call_host_function(doc, name, values),
        }
    }

    fn call_host_function(
        &self,
        doc: &Document,
        name: &str,
        values: Vec<Value>,
    ) -> ReflectionResult<Value> {
        let function = self.functions.get(name).ok_or_else(|| {
            ReflectionError::Expression(format!("unknown function '{}'", name))
        })?;

        // Host callbacks are pure and have no document access: collapse
        // node-sets to their string-value before the call.
        let scalars: Vec<Value> = values
            .into_iter()
            .map(|v| match v {
                Value::Nodes(_) => Value::Text(v.string_value(doc)),
                other => other,
            })
            .collect();

        function(&scalars)
            .map_err(|message| ReflectionError::Expression(format!("{}(): {}", name, message)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Document {
        let mut doc = Document::new("data");
        let params = doc.add_element(doc.root(), "params");
        doc.add_text_element(params, "today", "2021-03-01");
        doc.add_text_element(params, "current-time", "09:30");

        let field = doc.add_element(doc.root(), "reflection-field");
        let section = doc.add_text_element(field, "section", "Articles");
        doc.set_attribute(section, "id", "5");
        doc.set_attribute(section, "handle", "articles");

        let entry = doc.add_element(field, "entry");
        doc.set_attribute(entry, "id", "42");
        doc.add_text_element(entry, "title", "Hello");
        doc.add_text_element(entry, "tag", "rust");
        doc.add_text_element(entry, "tag", "cms");
        doc
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(FunctionRegistry::new())
    }

    #[test]
    fn absolute_path_selects_string_value() {
        let doc = sample_doc();
        let value = evaluator()
            .evaluate(&doc, "/data/reflection-field/entry/title")
            .unwrap();
        assert_eq!(value.string_value(&doc), "Hello");
    }

    #[test]
    fn attribute_step() {
        let doc = sample_doc();
        let value = evaluator()
            .evaluate(&doc, "/data/reflection-field/entry/@id")
            .unwrap();
        assert_eq!(value.string_value(&doc), "42");
    }

    #[test]
    fn descendant_step_finds_nested_elements() {
        let doc = sample_doc();
        let value = evaluator().evaluate(&doc, "//title").unwrap();
        assert_eq!(value.string_value(&doc), "Hello");
    }

    #[test]
    fn position_predicate_is_one_based() {
        let doc = sample_doc();
        let value = evaluator()
            .evaluate(&doc, "/data/reflection-field/entry/tag[2]")
            .unwrap();
        assert_eq!(value.string_value(&doc), "cms");
    }

    #[test]
    fn equality_predicate_on_attribute() {
        let doc = sample_doc();
        let value = evaluator()
            .evaluate(&doc, "/data/reflection-field/section[@handle='articles']/@id")
            .unwrap();
        assert_eq!(value.string_value(&doc), "5");
        let empty = evaluator()
            .evaluate(&doc, "/data/reflection-field/section[@handle='news']/@id")
            .unwrap();
        assert_eq!(empty.string_value(&doc), "");
    }

    #[test]
    fn count_and_concat_builtins() {
        let doc = sample_doc();
        let count = evaluator()
            .evaluate(&doc, "count(/data/reflection-field/entry/tag)")
            .unwrap();
        assert_eq!(count, Value::Number(2.0));

        let joined = evaluator()
            .evaluate(
                &doc,
                "concat(/data/params/today, ' ', /data/params/current-time)",
            )
            .unwrap();
        assert_eq!(joined.string_value(&doc), "2021-03-01 09:30");
    }

    #[test]
    fn host_function_dispatch() {
        let doc = sample_doc();
        let mut registry = FunctionRegistry::new();
        registry.register("shout", |args| match args {
            [Value::Text(s)] => Ok(Value::Text(format!("{}!", s.to_uppercase()))),
            _ => Err("expects one string".to_string()),
        });
        let value = Evaluator::new(registry)
            .evaluate(&doc, "shout(/data/reflection-field/entry/title)")
            .unwrap();
        assert_eq!(value.string_value(&doc), "HELLO!");
    }

    #[test]
    fn unknown_function_is_an_expression_error() {
        let doc = sample_doc();
        let err = evaluator().evaluate(&doc, "nope(/data)").unwrap_err();
        assert!(matches!(err, ReflectionError::Expression(_)));
    }

    #[test]
    fn text_node_test() {
        let doc = sample_doc();
        let value = evaluator()
            .evaluate(&doc, "/data/reflection-field/entry/title/text()")
            .unwrap();
        assert_eq!(value.string_value(&doc), "Hello");
    }
}
