//! The document arena
//!
//! A [`Document`] owns its source text, the line index and every node the
//! tree builder produced. Nodes refer to each other by [`NodeId`]; the root
//! is always `NodeId::ROOT` and spans the whole text.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::node::{Attribute, Element, Node, NodeId, NodeKind};
use crate::position::{LineIndex, Position, Range, Span};

/// Top-level grammar used to parse a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Full markup: elements, prolog, DOCTYPE
    #[default]
    Xml,
    /// A bare sequence of markup declarations
    Dtd,
}

impl Dialect {
    /// Extensions parsed as DTD files by default
    pub const DTD_EXTENSIONS: [&'static str; 3] = ["dtd", "ent", "mod"];

    /// Pick the dialect from a file extension (without the dot)
    pub fn from_extension(extension: &str) -> Self {
        if Self::DTD_EXTENSIONS
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
        {
            Dialect::Dtd
        } else {
            Dialect::Xml
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or_default()
    }
}

/// Parsed document: source text plus node arena
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    dialect: Dialect,
    nodes: Vec<Node>,
    line_index: LineIndex,
}

impl Document {
    /// Create a document holding only its root node
    pub fn new(text: impl Into<String>, dialect: Dialect) -> Self {
        let text = text.into();
        let line_index = LineIndex::new(&text);
        let root = Node {
            kind: NodeKind::Document,
            span: Span::new(0, text.len()),
            parent: None,
            children: Vec::new(),
        };
        Self {
            text,
            dialect,
            nodes: vec![root],
            line_index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    // ==================== Construction ====================

    /// Append a node as the last child of `parent`
    pub fn add_node(&mut self, parent: NodeId, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            span,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Append an attribute to an element or processing instruction
    ///
    /// Attributes are owned by `owner` but are not part of its children.
    pub fn add_attribute(&mut self, owner: NodeId, attribute: Attribute, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: NodeKind::Attribute(attribute),
            span,
            parent: Some(owner),
            children: Vec::new(),
        });
        match &mut self.nodes[owner.0].kind {
            NodeKind::Element(element) => element.attributes.push(id),
            NodeKind::ProcessingInstruction(pi) => pi.attributes.push(id),
            _ => {}
        }
        id
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    // ==================== Navigation ====================

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.0].span
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Number of nodes in the arena, attributes included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all arena entries in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Parent chain from the nearest parent up to the root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Number of ancestors; the root has depth 0
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// All nodes below `id` in document order, attributes excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        result
    }

    /// First element child of the root
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&child| self.element(child).is_some_and(|el| !el.orphan_end_tag))
    }

    /// The DOCTYPE node, if the prolog has one
    pub fn doctype(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .copied()
            .find(|&child| matches!(self.kind(child), NodeKind::DocumentType(_)))
    }

    /// Deepest non-attribute node whose span contains `offset`
    pub fn find_node_at(&self, offset: usize) -> NodeId {
        let mut current = NodeId::ROOT;
        'descend: loop {
            for &child in self.children(current) {
                let span = self.span(child);
                if span.start > offset {
                    break;
                }
                if span.contains(offset) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Attribute of the node at `offset` whose span contains it
    pub fn find_attribute_at(&self, offset: usize) -> Option<NodeId> {
        let node = self.find_node_at(offset);
        self.attributes(node)
            .iter()
            .copied()
            .find(|&attr| {
                let span = self.span(attr);
                span.contains(offset) || span.end == offset
            })
    }

    // ==================== Payload access ====================

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|el| el.name.as_deref())
    }

    pub fn as_attribute(&self, id: NodeId) -> Option<&Attribute> {
        match self.kind(id) {
            NodeKind::Attribute(attr) => Some(attr),
            _ => None,
        }
    }

    /// Attributes of an element or processing instruction, in source order
    pub fn attributes(&self, id: NodeId) -> &[NodeId] {
        match self.kind(id) {
            NodeKind::Element(element) => &element.attributes,
            NodeKind::ProcessingInstruction(pi) => &pi.attributes,
            _ => &[],
        }
    }

    /// Look up an attribute by name; with duplicates the last one wins
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.attributes(id)
            .iter()
            .rev()
            .filter_map(|&attr| self.as_attribute(attr))
            .find(|attr| attr.name == name)
    }

    /// Value text of an attribute, delimiters stripped
    pub fn attribute_value(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attribute(id, name)
            .and_then(|attr| attr.value_text(&self.text))
    }

    // ==================== Text & positions ====================

    pub fn slice(&self, span: Span) -> &str {
        span.slice(&self.text)
    }

    /// Source text covered by a node
    pub fn node_text(&self, id: NodeId) -> &str {
        self.slice(self.span(id))
    }

    pub fn position_at(&self, offset: usize) -> Result<Position> {
        self.line_index.position_at(&self.text, offset)
    }

    pub fn offset_at(&self, position: Position) -> Result<usize> {
        self.line_index.offset_at(&self.text, position)
    }

    pub fn range_of(&self, span: Span) -> Result<Range> {
        self.line_index.range_of(&self.text, span)
    }

    /// Line break used by the text: the first one found, `\n` otherwise
    pub fn line_delimiter(&self) -> &'static str {
        let bytes = self.text.as_bytes();
        match bytes.iter().position(|&b| b == b'\r' || b == b'\n') {
            Some(i) if bytes[i] == b'\r' && bytes.get(i + 1) == Some(&b'\n') => "\r\n",
            Some(i) if bytes[i] == b'\r' => "\r",
            _ => "\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AttributeValue;

    /// `<a x="1" x="2"><b/></a>` assembled by hand
    fn sample() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new(r#"<a x="1" x="2"><b/></a>"#, Dialect::Xml);
        let a = doc.add_node(
            NodeId::ROOT,
            NodeKind::Element(Element {
                name: Some("a".to_string()),
                name_span: Some(Span::new(1, 2)),
                closed: true,
                ..Default::default()
            }),
            Span::new(0, 23),
        );
        for (start, value) in [(3usize, "1"), (9, "2")] {
            let attr = Attribute {
                name: "x".to_string(),
                name_span: Span::new(start, start + 1),
                assign: Some(start + 1),
                value: Some(AttributeValue {
                    span: Span::new(start + 2, start + 5),
                    quote: Some('"'),
                    closed: true,
                }),
            };
            let id = doc.add_attribute(a, attr, Span::new(start, start + 5));
            assert_eq!(doc.attribute_value(a, "x"), Some(value));
            assert_eq!(doc.parent(id), Some(a));
        }
        let b = doc.add_node(
            a,
            NodeKind::Element(Element {
                name: Some("b".to_string()),
                self_closed: true,
                closed: true,
                ..Default::default()
            }),
            Span::new(15, 19),
        );
        (doc, a, b)
    }

    #[test]
    fn test_root_spans_text() {
        let doc = Document::new("abc", Dialect::Xml);
        assert_eq!(doc.span(doc.root()), Span::new(0, 3));
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn test_attributes_are_not_children() {
        let (doc, a, b) = sample();
        assert_eq!(doc.children(a), &[b]);
        assert_eq!(doc.attributes(a).len(), 2);
    }

    #[test]
    fn test_duplicate_attribute_last_wins() {
        let (doc, a, _) = sample();
        assert_eq!(doc.attribute_value(a, "x"), Some("2"));
    }

    #[test]
    fn test_navigation() {
        let (doc, a, b) = sample();
        assert_eq!(doc.depth(b), 2);
        assert_eq!(doc.ancestors(b).collect::<Vec<_>>(), vec![a, NodeId::ROOT]);
        assert_eq!(doc.descendants(NodeId::ROOT), vec![a, b]);
        assert_eq!(doc.document_element(), Some(a));
    }

    #[test]
    fn test_find_node_at() {
        let (doc, a, b) = sample();
        assert_eq!(doc.find_node_at(0), a);
        assert_eq!(doc.find_node_at(16), b);
        assert_eq!(doc.find_node_at(19), a);
        assert_eq!(doc.find_node_at(23), NodeId::ROOT);
        assert!(doc.find_attribute_at(10).is_some());
    }

    #[test]
    fn test_line_delimiter_detection() {
        assert_eq!(Document::new("<a/>", Dialect::Xml).line_delimiter(), "\n");
        assert_eq!(Document::new("<a>\r\n</a>", Dialect::Xml).line_delimiter(), "\r\n");
        assert_eq!(Document::new("<a>\r</a>", Dialect::Xml).line_delimiter(), "\r");
    }

    #[test]
    fn test_dialect_from_extension() {
        assert_eq!(Dialect::from_extension("dtd"), Dialect::Dtd);
        assert_eq!(Dialect::from_extension("ENT"), Dialect::Dtd);
        assert_eq!(Dialect::from_extension("xml"), Dialect::Xml);
        assert_eq!(Dialect::from_path(Path::new("a/b.mod")), Dialect::Dtd);
        assert_eq!(Dialect::from_path(Path::new("noext")), Dialect::Xml);
    }
}
