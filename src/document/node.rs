//! Arena-backed structured document tree.
//!
//! The context document is ephemeral: built fresh per compilation, evaluated,
//! then dropped. Nodes live in a flat arena and reference each other by
//! index, which keeps traversal and cloning cheap and avoids reference
//! counting for a tree that never outlives one compile call.

use std::fmt::Write as _;

/// Index of a node within its owning [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A mutable element/text tree with attributes on elements.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Create a document with a single root element.
    pub fn new(root_name: &str) -> Self {
        let root = NodeData {
            kind: NodeKind::Element {
                name: root_name.to_string(),
                attributes: Vec::new(),
            },
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append a child element and return its id.
    pub fn add_element(&mut self, parent: NodeId, name: &str) -> NodeId {
        self.push_node(
            parent,
            NodeKind::Element {
                name: name.to_string(),
                attributes: Vec::new(),
            },
        )
    }

    /// Append a text node.
    pub fn add_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push_node(parent, NodeKind::Text(text.to_string()))
    }

    /// Append an element with a single text child, `<name>text</name>`.
    pub fn add_text_element(&mut self, parent: NodeId, name: &str, text: &str) -> NodeId {
        let element = self.add_element(parent, name);
        if !text.is_empty() {
            self.add_text(element, text);
        }
        element
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Set (or overwrite) an attribute on an element. No-op on text nodes.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            if let Some(existing) = attributes.iter_mut().find(|(n, _)| n == name) {
                existing.1 = value.to_string();
            } else {
                attributes.push((name.to_string(), value.to_string()));
            }
        }
    }

    /// Element name, or `None` for text nodes.
    pub fn name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        match &self.nodes[node.0].kind {
            NodeKind::Element { attributes, .. } => attributes,
            NodeKind::Text(_) => &[],
        }
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Text(_))
    }

    /// The text content of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(content) => Some(content),
            NodeKind::Element { .. } => None,
        }
    }

    /// Concatenated descendant text, in document order.
    pub fn string_value(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(content) => out.push_str(content),
            NodeKind::Element { .. } => {
                for child in &self.nodes[node.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// All descendant elements of `node`, in document order, excluding
    /// `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(node, &mut out);
        out
    }

    fn collect_descendants(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.nodes[node.0].children {
            if self.is_element(*child) {
                out.push(*child);
            }
            self.collect_descendants(*child, out);
        }
    }

    /// Serialize to XML text with escaped attribute and text content.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node.0].kind {
            NodeKind::Text(content) => out.push_str(&escape(content)),
            NodeKind::Element { name, attributes } => {
                let _ = write!(out, "<{}", name);
                for (attr, value) in attributes {
                    let _ = write!(out, " {}=\"{}\"", attr, escape(value));
                }
                if self.nodes[node.0].children.is_empty() {
                    out.push_str(" />");
                } else {
                    out.push('>');
                    for child in &self.nodes[node.0].children {
                        self.write_node(*child, out);
                    }
                    let _ = write!(out, "</{}>", name);
                }
            }
        }
    }
}

/// Escape markup-significant characters for serialization.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut doc = Document::new("data");
        let params = doc.add_element(doc.root(), "params");
        doc.add_text_element(params, "today", "2021-03-01");
        let entry = doc.add_element(doc.root(), "entry");
        doc.set_attribute(entry, "id", "42");
        doc.add_text_element(entry, "title", "Hello & <World>");
        doc
    }

    #[test]
    fn string_value_concatenates_descendant_text() {
        let doc = sample();
        assert_eq!(doc.string_value(doc.root()), "2021-03-01Hello & <World>");
    }

    #[test]
    fn attributes_overwrite_by_name() {
        let mut doc = Document::new("data");
        let root = doc.root();
        doc.set_attribute(root, "id", "1");
        doc.set_attribute(root, "id", "2");
        assert_eq!(doc.attribute(root, "id"), Some("2"));
        assert_eq!(doc.attributes(root).len(), 1);
    }

    #[test]
    fn serialization_escapes_text_and_attributes() {
        let doc = sample();
        let xml = doc.to_xml();
        assert!(xml.contains("<title>Hello &amp; &lt;World&gt;</title>"));
        assert!(xml.contains("<entry id=\"42\">"));
    }

    #[test]
    fn descendants_are_in_document_order() {
        let doc = sample();
        let names: Vec<_> = doc
            .descendants(doc.root())
            .into_iter()
            .filter_map(|n| doc.name(n).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["params", "today", "entry", "title"]);
    }
}
