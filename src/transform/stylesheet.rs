//! Declarative stylesheets.
//!
//! A stylesheet is an ordered list of rules. Each rule selects nodes from
//! the input document with a path expression and emits one output element
//! per selected node, carrying the node's string-value and, optionally,
//! its attributes. Rules are applied in order under a fresh output root.

use crate::document::Document;
use crate::error::ReflectionResult;
use crate::expression::{Evaluator, NodeRef, Value};
use serde::{Deserialize, Serialize};

fn default_root() -> String {
    "data".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Path expression selecting input nodes.
    pub select: String,
    /// Name of the emitted output element.
    pub element: String,
    /// Copy the selected element's attributes onto the output element.
    #[serde(default)]
    pub copy_attributes: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stylesheet {
    #[serde(default = "default_root")]
    pub root: String,
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Apply all rules to `input`, producing a new document.
    pub fn apply(&self, input: &Document) -> ReflectionResult<Document> {
        let evaluator = Evaluator::default();
        let mut output = Document::new(&self.root);

        for rule in &self.rules {
            match evaluator.evaluate(input, &rule.select)? {
                Value::Nodes(nodes) => {
                    for node in nodes {
                        let text = match &node {
                            NodeRef::Node(id) => input.string_value(*id),
                            NodeRef::Attribute { element, name } => input
                                .attribute(*element, name)
                                .unwrap_or_default()
                                .to_string(),
                        };
                        let emitted = output.add_text_element(output.root(), &rule.element, &text);
                        if rule.copy_attributes {
                            if let NodeRef::Node(id) = node {
                                for (name, value) in input.attributes(id).to_vec() {
                                    output.set_attribute(emitted, &name, &value);
                                }
                            }
                        }
                    }
                }
                scalar => {
                    let text = scalar.string_value(input);
                    output.add_text_element(output.root(), &rule.element, &text);
                }
            }
        }

        Ok(output)
    }
}
