//! Smart selection for XML documents
//!
//! Provides hierarchy-aware selection expansion:
//! - Attribute value → attribute → start tag → element → ancestors → document
//! - Tag name → start or end tag → element → ...
//! - Text → element → ...

use tower_lsp::lsp_types::SelectionRange;
use xmlsense_dom::{Document, NodeId, NodeKind, Span};

use crate::document::to_lsp_range;

/// Classification of selection scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    AttributeValue,
    Attribute,
    Name,
    Tag,
    Text,
    Node,
    Document,
}

/// Represents a selection level with metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionLevel {
    pub span: Span,
    pub kind: SelectionKind,
}

/// Analyzer for generating selection range hierarchies
pub struct SelectionAnalyzer<'a> {
    doc: &'a Document,
}

impl<'a> SelectionAnalyzer<'a> {
    pub fn new(doc: &'a Document) -> Self {
        Self { doc }
    }

    /// Selection levels around `offset`, innermost first
    ///
    /// Every level encloses the one before it, and no two consecutive
    /// levels cover the same span.
    pub fn get_selection_hierarchy(&self, offset: usize) -> Vec<SelectionLevel> {
        let doc = self.doc;
        let offset = offset.min(doc.len());
        let mut levels = Vec::new();
        let node = doc.find_node_at(offset);

        if let Some(attr_id) = doc.find_attribute_at(offset) {
            if let Some(value) = doc.as_attribute(attr_id).and_then(|attr| attr.value) {
                let content = value.content_span();
                if covers(content, offset) {
                    self.push(&mut levels, content, SelectionKind::AttributeValue);
                }
                if covers(value.span, offset) {
                    self.push(&mut levels, value.span, SelectionKind::AttributeValue);
                }
            }
            self.push(&mut levels, doc.span(attr_id), SelectionKind::Attribute);
        }

        match doc.kind(node) {
            NodeKind::Element(element) => {
                let span = doc.span(node);
                let start_tag = start_tag_span(span, element.start_tag_close, element.self_closed);
                let end_tag = element.end_tag_open.map(|open| {
                    let close = element.end_tag_close.map_or(span.end, |close| close + 1);
                    Span::new(open, close)
                });

                if let Some(end_tag) = end_tag.filter(|tag| covers(*tag, offset)) {
                    if let Some(name) = element.end_tag_name.filter(|name| covers(*name, offset)) {
                        self.push(&mut levels, name, SelectionKind::Name);
                    }
                    self.push(&mut levels, end_tag, SelectionKind::Tag);
                } else if covers(start_tag, offset) {
                    if let Some(name) = element.name_span.filter(|name| covers(*name, offset)) {
                        self.push(&mut levels, name, SelectionKind::Name);
                    }
                    self.push(&mut levels, start_tag, SelectionKind::Tag);
                }
            }
            NodeKind::Text => {
                let span = doc.span(node);
                let text = doc.slice(span);
                let leading = text.len() - text.trim_start().len();
                let trimmed = Span::new(span.start + leading, span.start + text.trim_end().len());
                if covers(trimmed, offset) {
                    self.push(&mut levels, trimmed, SelectionKind::Text);
                }
            }
            _ => {}
        }

        for id in std::iter::once(node).chain(doc.ancestors(node)) {
            if id == NodeId::ROOT {
                break;
            }
            // text spans carry the surrounding whitespace
            if doc.kind(id).is_text() {
                continue;
            }
            self.push(&mut levels, doc.span(id), SelectionKind::Node);
        }
        self.push(&mut levels, Span::new(0, doc.len()), SelectionKind::Document);
        levels
    }

    /// Linked LSP selection range for `offset`, innermost level on top
    pub fn selection_range(&self, offset: usize) -> Option<SelectionRange> {
        let mut result: Option<SelectionRange> = None;
        for level in self.get_selection_hierarchy(offset).into_iter().rev() {
            let range = to_lsp_range(self.doc.range_of(level.span).ok()?);
            result = Some(SelectionRange {
                range,
                parent: result.map(Box::new),
            });
        }
        result
    }

    fn push(&self, levels: &mut Vec<SelectionLevel>, span: Span, kind: SelectionKind) {
        if span.end > self.doc.len() || span.start > span.end {
            return;
        }
        if let Some(last) = levels.last() {
            if last.span == span || !span.encloses(last.span) {
                return;
            }
        }
        levels.push(SelectionLevel { span, kind });
    }
}

/// Whether `offset` lies inside `span` or touches its end
fn covers(span: Span, offset: usize) -> bool {
    span.start <= offset && offset <= span.end
}

fn start_tag_span(element: Span, close: Option<usize>, self_closed: bool) -> Span {
    let end = match close {
        Some(close) if self_closed => close + 2,
        Some(close) => close + 1,
        None => element.end,
    };
    Span::new(element.start, end.min(element.end))
}
