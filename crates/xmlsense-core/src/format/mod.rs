//! Formatting engine
//!
//! The formatter walks the tree once and compares the whitespace between
//! nodes with the whitespace it wants there. Every difference becomes one
//! [`TextEdit`] spanning only that whitespace run, so the result is a
//! minimal, sorted, non-overlapping edit list and formatting already
//! formatted text yields no edits.
//!
//! # Example
//!
//! ```
//! use xmlsense_core::{apply_edits, format, parse, FormattingSettings};
//! use xmlsense_dom::Dialect;
//!
//! let doc = parse("<a><b/></a>", Dialect::Xml);
//! let edits = format(&doc, &FormattingSettings::default(), None).unwrap();
//! assert_eq!(apply_edits(doc.text(), &edits), "<a>\n  <b />\n</a>");
//! ```

mod cancel;
mod category;
mod content;
mod doctype;
mod edit;
mod element;
mod markup;
mod provider;
mod settings;
mod trailing;


pub use cancel::CancellationToken;
pub use category::ContentCategory;
pub use edit::{apply_edits, TextEdit};
pub use provider::{ContentModelProvider, InternalSubsetContentModel, NoContentModel};
pub use settings::{EmptyElements, EnforceQuoteStyle, FormattingSettings, QuoteStyle};

use xmlsense_dom::{Document, NodeId, NodeKind, Range, Span};

use crate::error::{FormatError, Result};
use content::{Container, ContainerKind};
use edit::EditList;

/// Format `doc`, or only the part of it covered by `range`
///
/// Uses no content model; see [`Formatter`] to supply one or a
/// cancellation token.
pub fn format(
    doc: &Document,
    settings: &FormattingSettings,
    range: Option<Range>,
) -> Result<Vec<TextEdit>> {
    let formatter = Formatter::new(settings);
    match range {
        Some(range) => formatter.format_range(doc, range),
        None => formatter.format(doc),
    }
}

/// Configured formatting request
pub struct Formatter<'a> {
    settings: &'a FormattingSettings,
    provider: &'a dyn ContentModelProvider,
    cancellation: Option<CancellationToken>,
}

impl<'a> Formatter<'a> {
    pub fn new(settings: &'a FormattingSettings) -> Self {
        Self {
            settings,
            provider: &NoContentModel,
            cancellation: None,
        }
    }

    /// Content model consulted when `grammar_aware_formatting` is set
    pub fn with_provider(mut self, provider: &'a dyn ContentModelProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Edits that format the whole document
    pub fn format(&self, doc: &Document) -> Result<Vec<TextEdit>> {
        self.run(doc, None)
    }

    /// Edits that format the part of the document inside `range`
    ///
    /// A range starting inside a start tag also covers the whitespace before
    /// that tag, so the element's own line is re-indented.
    pub fn format_range(&self, doc: &Document, range: Range) -> Result<Vec<TextEdit>> {
        let start = doc.offset_at(range.start)?;
        let end = doc.offset_at(range.end)?;
        let start = leading_edge(doc, start.min(end));
        self.run(doc, Some(Span::new(start, start.max(end))))
    }

    fn run(&self, doc: &Document, range: Option<Span>) -> Result<Vec<TextEdit>> {
        let mut context = Context {
            doc,
            settings: self.settings,
            provider: self.provider,
            cancellation: self.cancellation.as_ref(),
            delimiter: doc.line_delimiter(),
            edits: EditList::new(doc.text(), range),
            protected: Vec::new(),
        };
        context.checkpoint()?;

        let root = Container {
            id: NodeId::ROOT,
            kind: ContainerKind::Document,
            content: Span::new(0, doc.len()),
            has_start: true,
            has_end: false,
            level: 0,
            child_level: 0,
            category: ContentCategory::IgnoreSpace,
        };
        context.format_content(&root)?;
        context.finish_document(range.is_none());
        context.edits.finish(doc)
    }
}

/// Start of the whitespace before the start tag holding `offset`, or
/// `offset` itself when it is not inside a start tag
fn leading_edge(doc: &Document, offset: usize) -> usize {
    let id = doc.find_node_at(offset);
    let Some(element) = doc.element(id) else {
        return offset;
    };
    if element.orphan_end_tag {
        return offset;
    }
    let tag_end = element
        .start_tag_close
        .unwrap_or(element.start_tag_content_end);
    let tag_start = doc.span(id).start;
    if offset > tag_end {
        return offset;
    }
    let before = &doc.text()[..tag_start];
    before.trim_end_matches([' ', '\t', '\r', '\n']).len()
}

/// State of one formatting walk
pub(crate) struct Context<'a> {
    doc: &'a Document,
    settings: &'a FormattingSettings,
    provider: &'a dyn ContentModelProvider,
    cancellation: Option<&'a CancellationToken>,
    /// Line break used for inserted newlines
    delimiter: &'static str,
    edits: EditList<'a>,
    /// Spans whose text must survive byte for byte
    protected: Vec<Span>,
}

impl<'a> Context<'a> {
    fn checkpoint(&self) -> Result<()> {
        match self.cancellation {
            Some(token) if token.is_cancelled() => Err(FormatError::Cancelled),
            _ => Ok(()),
        }
    }

    fn indent(&self, level: usize) -> String {
        self.settings.indent(level)
    }

    fn newline_indent(&self, level: usize) -> String {
        self.newlines_indent(1, level)
    }

    fn newlines_indent(&self, count: usize, level: usize) -> String {
        let mut text = self.delimiter.repeat(count);
        text.push_str(&self.indent(level));
        text
    }

    /// Replace `span` only when it holds nothing but whitespace
    fn replace_blank(&mut self, span: Span, new_text: &str) {
        if span.start <= span.end
            && span.end <= self.doc.len()
            && edit::is_blank(self.doc.slice(span))
        {
            self.edits.replace(span, new_text);
        }
    }

    /// Whether `span` meets the requested range
    fn meets_range(&self, span: Span) -> bool {
        match self.edits.range() {
            Some(range) => range.start <= span.end && span.start <= range.end,
            None => true,
        }
    }

    /// Whether a line of `width` characters placed after `offset` needs to
    /// move onto a continuation line at `level`
    fn exceeds_width(&self, offset: usize, width: usize, level: usize) -> bool {
        let max = self.settings.max_line_width;
        if max == 0 {
            return false;
        }
        let column = self.edits.column_at(offset);
        column > self.indent(level).chars().count() && column + 1 + width > max
    }

    /// Format one node placed at indent `level` inside content of category
    /// `parent`
    fn format_node(&mut self, id: NodeId, level: usize, parent: ContentCategory) -> Result<()> {
        self.checkpoint()?;
        let doc = self.doc;
        match doc.kind(id) {
            NodeKind::Element(_) => self.format_element(id, level, parent)?,
            NodeKind::Comment(data) => self.format_comment(*data, level),
            NodeKind::CData(data) => self.format_cdata(*data, parent),
            NodeKind::ProcessingInstruction(pi) => self.format_processing_instruction(id, pi),
            NodeKind::DocumentType(doctype) => self.format_doctype(id, doctype, level)?,
            NodeKind::ElementDecl(decl)
            | NodeKind::AttlistDecl(decl)
            | NodeKind::EntityDecl(decl)
            | NodeKind::NotationDecl(decl) => self.format_declaration(id, decl, level),
            NodeKind::Document
            | NodeKind::Attribute(_)
            | NodeKind::Text
            | NodeKind::UnknownDecl { .. }
            | NodeKind::DtdText => {}
        }
        Ok(())
    }
}
