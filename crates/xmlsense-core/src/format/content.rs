//! Layout of the whitespace between the children of a container
//!
//! A container (the document, an element body or a DOCTYPE internal
//! subset) is a sequence of pieces: markup nodes and the words of its text
//! nodes. The whitespace before the first piece, between two pieces and
//! after the last one is a run; each run gets one desired value.

use xmlsense_dom::{NodeId, NodeKind, Span};

use super::category::ContentCategory;
use super::edit::{count_newlines, is_blank};
use super::Context;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerKind {
    Document,
    Element,
    Subset,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Container {
    pub id: NodeId,
    pub kind: ContainerKind,
    /// Text between the opening and closing delimiters
    pub content: Span,
    /// The opening delimiter is complete
    pub has_start: bool,
    /// A closing delimiter follows the content
    pub has_end: bool,
    /// Indent level of the container's own delimiters
    pub level: usize,
    /// Indent level of its children
    pub child_level: usize,
    pub category: ContentCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Markup(NodeId, Span),
    Word(Span),
}

impl Piece {
    fn span(self) -> Span {
        match self {
            Piece::Markup(_, span) | Piece::Word(span) => span,
        }
    }

    fn is_word(self) -> bool {
        matches!(self, Piece::Word(_))
    }
}

impl<'a> Context<'a> {
    pub(crate) fn format_content(&mut self, container: &Container) -> Result<()> {
        let pieces = self.pieces(container.id);
        let mut cursor = container.content.start;
        let mut previous = None;
        for piece in pieces {
            let span = piece.span();
            if span.start < cursor {
                continue;
            }
            self.layout_run(container, Span::new(cursor, span.start), previous, Some(piece));
            if let Piece::Markup(id, _) = piece {
                if self.meets_range(span) {
                    self.format_node(id, container.child_level, container.category)?;
                }
            }
            cursor = span.end;
            previous = Some(piece);
        }
        let end = container.content.end.max(cursor);
        self.layout_run(container, Span::new(cursor, end), previous, None);
        Ok(())
    }

    fn pieces(&self, id: NodeId) -> Vec<Piece> {
        let doc = self.doc;
        let mut pieces = Vec::new();
        for &child in doc.children(id) {
            let span = doc.span(child);
            match doc.kind(child) {
                NodeKind::Text => pieces.extend(words(doc.text(), span).map(Piece::Word)),
                NodeKind::Element(element) if !element.closed && !element.self_closed => {
                    // Trailing whitespace of an element without an end tag
                    // belongs to the parent's run.
                    let text = doc.slice(span);
                    let trimmed = text.trim_end_matches([' ', '\t', '\r', '\n']);
                    let end = span.start + trimmed.len();
                    pieces.push(Piece::Markup(child, Span::new(span.start, end)));
                }
                _ => pieces.push(Piece::Markup(child, span)),
            }
        }
        pieces
    }

    fn layout_run(
        &mut self,
        container: &Container,
        run: Span,
        previous: Option<Piece>,
        next: Option<Piece>,
    ) {
        let source = self.doc.slice(run);
        if !is_blank(source) {
            return;
        }
        if let Some(text) = self.desired_run(container, run, source, previous, next) {
            self.edits.replace(run, &text);
        }
    }

    fn desired_run(
        &self,
        container: &Container,
        run: Span,
        source: &str,
        previous: Option<Piece>,
        next: Option<Piece>,
    ) -> Option<String> {
        let settings = self.settings;
        let newlines = count_newlines(source);
        let previous_is_word = previous.is_some_and(Piece::is_word);
        if previous.is_none() && !container.has_start {
            return None;
        }

        let Some(next) = next else {
            if !container.has_end {
                return None;
            }
            if previous.is_none() {
                let collapse =
                    container.kind == ContainerKind::Subset || !settings.preserve_empty_content;
                return collapse.then(String::new);
            }
            if container.category == ContentCategory::IgnoreSpace && !previous_is_word {
                return Some(self.newline_indent(container.level));
            }
            if newlines > 0 {
                if settings.join_content_lines {
                    return Some(" ".to_string());
                }
                return Some(self.newline_indent(container.level));
            }
            return (previous_is_word && !source.is_empty()).then(|| " ".to_string());
        };

        if let Piece::Markup(id, _) = next {
            if self.is_untouchable(id) {
                return None;
            }
        }
        if previous.is_none() && container.kind == ContainerKind::Document {
            return Some(String::new());
        }

        let word_adjacent = previous_is_word || next.is_word();
        if container.category == ContentCategory::IgnoreSpace && !word_adjacent {
            if newlines == 0 && self.is_comment(next) {
                return (!source.is_empty()).then(|| " ".to_string());
            }
            let count = newlines.clamp(1, settings.preserved_newlines + 1);
            return Some(self.newlines_indent(count, container.child_level));
        }

        if newlines > 0 {
            if !settings.join_content_lines {
                let count = newlines.min(settings.preserved_newlines + 1);
                return Some(self.newlines_indent(count, container.child_level));
            }
        } else if !word_adjacent || source.is_empty() {
            return None;
        }

        if let Piece::Word(word) = next {
            let width = self.doc.slice(word).chars().count();
            if self.exceeds_width(run.start, width, container.child_level) {
                return Some(self.newline_indent(container.child_level));
            }
        }
        Some(" ".to_string())
    }

    fn is_comment(&self, piece: Piece) -> bool {
        matches!(piece, Piece::Markup(id, _) if matches!(self.doc.kind(id), NodeKind::Comment(_)))
    }

    /// Constructs left as written together with the whitespace before them
    fn is_untouchable(&self, id: NodeId) -> bool {
        match self.doc.kind(id) {
            NodeKind::Comment(data) => !data.closed || !self.settings.format_comments,
            NodeKind::CData(data) => !data.closed,
            NodeKind::ProcessingInstruction(pi) => !pi.closed,
            NodeKind::DocumentType(doctype) => !doctype.closed,
            NodeKind::ElementDecl(decl)
            | NodeKind::AttlistDecl(decl)
            | NodeKind::EntityDecl(decl)
            | NodeKind::NotationDecl(decl) => !decl.closed,
            NodeKind::UnknownDecl { .. } => true,
            _ => false,
        }
    }
}

/// Maximal non-whitespace runs of `text` inside `span`
fn words(text: &str, span: Span) -> impl Iterator<Item = Span> + '_ {
    let bytes = text
        .as_bytes()
        .get(span.start..span.end)
        .unwrap_or_default();
    let mut index = 0;
    std::iter::from_fn(move || {
        while index < bytes.len() && is_space(bytes[index]) {
            index += 1;
        }
        if index == bytes.len() {
            return None;
        }
        let start = index;
        while index < bytes.len() && !is_space(bytes[index]) {
            index += 1;
        }
        Some(Span::new(span.start + start, span.start + index))
    })
}

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}
