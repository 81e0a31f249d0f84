//! Tolerant tree builder
//!
//! This module turns the scanner's token stream into a [`Document`].
//!
//! - Start tags push onto an open-element stack; `/>` pops immediately
//! - An end tag closes the nearest open element with the same name and
//!   implicitly closes everything opened after it
//! - An end tag that matches nothing becomes an orphan element marker
//! - Comments, CDATA, PIs, DOCTYPEs and declarations interrupted by new
//!   markup end at their last token and stay unclosed
//!
//! Parsing never fails; malformed input yields best-effort nodes.
//!
//! # Example
//!
//! ```
//! use xmlsense_core::parser::parse;
//! use xmlsense_dom::Dialect;
//!
//! let doc = parse("<a><b></a>", Dialect::Xml);
//! let a = doc.document_element().unwrap();
//! assert!(doc.element(a).unwrap().closed);
//! let b = doc.children(a)[0];
//! assert!(!doc.element(b).unwrap().closed);
//! ```

use xmlsense_dom::{
    Attribute, AttributeValue, CharacterData, Declaration, Dialect, Document, DocumentType,
    DocumentTypeKind, Element, NodeId, NodeKind, ProcessingInstruction, Span,
};

use crate::scanner::{Scanner, TokenType};

/// Token-driven tree builder state
struct Parser<'a> {
    scanner: Scanner<'a>,
    doc: Document,
    /// Open elements, innermost last
    stack: Vec<NodeId>,
    /// Element or prolog receiving attribute tokens
    attr_owner: Option<NodeId>,
    /// Attribute waiting for `=` or a value
    current_attribute: Option<NodeId>,
    /// Offset of a `</` whose name has not been seen yet
    end_tag_open: Option<usize>,
    /// Element or orphan whose end tag awaits `>`
    pending_end: Option<NodeId>,
    /// Comment, CDATA, PI or declaration awaiting its close token
    open_leaf: Option<NodeId>,
    open_doctype: Option<NodeId>,
    in_subset: bool,
    /// End of the last non-whitespace token
    last_token_end: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, dialect: Dialect) -> Self {
        Self {
            scanner: Scanner::for_dialect(text, dialect),
            doc: Document::new(text, dialect),
            stack: Vec::new(),
            attr_owner: None,
            current_attribute: None,
            end_tag_open: None,
            pending_end: None,
            open_leaf: None,
            open_doctype: None,
            in_subset: false,
            last_token_end: 0,
        }
    }

    /// Consume every token and return the finished document
    fn parse(mut self) -> Document {
        loop {
            let token = self.scanner.scan_token();
            if token == TokenType::Eos {
                break;
            }
            let span = self.scanner.token_span();
            self.process(token, span);
            if token != TokenType::Whitespace {
                self.last_token_end = span.end;
            }
        }
        self.finish()
    }

    /// Parent for the next markup node
    fn current_parent(&self) -> NodeId {
        if self.in_subset {
            if let Some(doctype) = self.open_doctype {
                return doctype;
            }
        }
        self.stack.last().copied().unwrap_or(NodeId::ROOT)
    }

    fn text(&self, span: Span) -> String {
        self.doc.slice(span).to_string()
    }

    fn set_end(&mut self, id: NodeId, end: usize) {
        self.doc.node_mut(id).span.end = end;
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.doc.node_mut(id).kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn process(&mut self, token: TokenType, span: Span) {
        match token {
            TokenType::StartTagOpen => {
                self.interrupt(true);
                let parent = self.current_parent();
                let element = Element {
                    start_tag_content_end: span.end,
                    ..Default::default()
                };
                let id = self.doc.add_node(parent, NodeKind::Element(element), span);
                self.stack.push(id);
                self.attr_owner = Some(id);
            }
            TokenType::StartTag => {
                if let Some(owner) = self.attr_owner {
                    let name = self.text(span);
                    if let Some(element) = self.element_mut(owner) {
                        element.name = Some(name);
                        element.name_span = Some(span);
                        element.start_tag_content_end = span.end;
                    }
                    self.set_end(owner, span.end);
                }
            }
            TokenType::AttributeName => {
                if let Some(owner) = self.attr_owner {
                    let attribute = Attribute {
                        name: self.text(span),
                        name_span: span,
                        assign: None,
                        value: None,
                    };
                    let id = self.doc.add_attribute(owner, attribute, span);
                    self.current_attribute = Some(id);
                    self.extend_tag(owner, span.end);
                }
            }
            TokenType::DelimiterAssign => {
                if let (Some(owner), Some(attr)) = (self.attr_owner, self.current_attribute) {
                    if let NodeKind::Attribute(attribute) = &mut self.doc.node_mut(attr).kind {
                        attribute.assign = Some(span.start);
                    }
                    self.set_end(attr, span.end);
                    self.extend_tag(owner, span.end);
                }
            }
            TokenType::AttributeValue => {
                if let (Some(owner), Some(attr)) = (self.attr_owner, self.current_attribute) {
                    let raw = self.doc.slice(span);
                    let quote = raw.chars().next().filter(|c| *c == '"' || *c == '\'');
                    let closed = quote.is_some_and(|q| raw.len() >= 2 && raw.ends_with(q));
                    if let NodeKind::Attribute(attribute) = &mut self.doc.node_mut(attr).kind {
                        attribute.value = Some(AttributeValue {
                            span,
                            quote,
                            closed,
                        });
                    }
                    self.set_end(attr, span.end);
                    self.extend_tag(owner, span.end);
                }
                self.current_attribute = None;
            }
            TokenType::StartTagClose | TokenType::StartTagSelfClose => {
                if let Some(owner) = self.attr_owner.take() {
                    let self_closed = token == TokenType::StartTagSelfClose;
                    if let Some(element) = self.element_mut(owner) {
                        element.start_tag_close = Some(span.start);
                        element.self_closed = self_closed;
                        element.closed = self_closed;
                    }
                    self.set_end(owner, span.end);
                    if self_closed && self.stack.last() == Some(&owner) {
                        self.stack.pop();
                    }
                }
                self.current_attribute = None;
            }
            TokenType::EndTagOpen => {
                self.interrupt(true);
                self.end_tag_open = Some(span.start);
            }
            TokenType::EndTag => self.end_tag(span),
            TokenType::EndTagClose => {
                if let Some(id) = self.pending_end.take() {
                    if let Some(element) = self.element_mut(id) {
                        element.end_tag_close = Some(span.start);
                    }
                    self.set_end(id, span.end);
                } else if let Some(open) = self.end_tag_open.take() {
                    self.orphan(None, open, span.end, Some(span.start));
                }
            }
            TokenType::Content => {
                self.interrupt(true);
                if !self.doc.slice(span).trim().is_empty() {
                    let parent = self.current_parent();
                    self.doc.add_node(parent, NodeKind::Text, span);
                }
            }
            TokenType::StartCommentTag | TokenType::CDataTagOpen => {
                self.interrupt(false);
                let data = CharacterData {
                    content: Span::new(span.end, span.end),
                    closed: false,
                };
                let kind = if token == TokenType::StartCommentTag {
                    NodeKind::Comment(data)
                } else {
                    NodeKind::CData(data)
                };
                let parent = self.current_parent();
                self.open_leaf = Some(self.doc.add_node(parent, kind, span));
            }
            TokenType::Comment | TokenType::CDataContent => {
                if let Some(id) = self.open_leaf {
                    if let NodeKind::Comment(data) | NodeKind::CData(data) =
                        &mut self.doc.node_mut(id).kind
                    {
                        data.content = span;
                    }
                    self.set_end(id, span.end);
                }
            }
            TokenType::EndCommentTag | TokenType::CDataTagClose => {
                if let Some(id) = self.open_leaf.take() {
                    if let NodeKind::Comment(data) | NodeKind::CData(data) =
                        &mut self.doc.node_mut(id).kind
                    {
                        data.closed = true;
                    }
                    self.set_end(id, span.end);
                }
            }
            TokenType::StartPrologOrPi => {
                self.interrupt(false);
                let parent = self.current_parent();
                let pi = ProcessingInstruction::default();
                let id = self
                    .doc
                    .add_node(parent, NodeKind::ProcessingInstruction(pi), span);
                self.open_leaf = Some(id);
            }
            TokenType::PrologName | TokenType::PiName => {
                if let Some(id) = self.open_leaf {
                    let name = self.text(span);
                    if let NodeKind::ProcessingInstruction(pi) = &mut self.doc.node_mut(id).kind {
                        pi.target = Some(name);
                        pi.target_span = Some(span);
                        pi.prolog = token == TokenType::PrologName;
                    }
                    self.set_end(id, span.end);
                    if token == TokenType::PrologName {
                        self.attr_owner = Some(id);
                    }
                }
            }
            TokenType::PiContent => {
                if let Some(id) = self.open_leaf {
                    if let NodeKind::ProcessingInstruction(pi) = &mut self.doc.node_mut(id).kind {
                        pi.content = Some(span);
                    }
                    self.set_end(id, span.end);
                }
            }
            TokenType::PiEnd | TokenType::PrologEnd => {
                if let Some(id) = self.open_leaf.take() {
                    if let NodeKind::ProcessingInstruction(pi) = &mut self.doc.node_mut(id).kind {
                        pi.closed = true;
                    }
                    self.set_end(id, span.end);
                }
                self.attr_owner = None;
                self.current_attribute = None;
            }
            TokenType::StartDoctypeTag => {
                self.interrupt(true);
                let parent = self.current_parent();
                let doctype = DocumentType::default();
                let id = self
                    .doc
                    .add_node(parent, NodeKind::DocumentType(doctype), span);
                self.open_doctype = Some(id);
            }
            TokenType::DoctypeParameter => {
                if let Some(id) = self.open_doctype {
                    let value = self.text(span);
                    if let NodeKind::DocumentType(doctype) = &mut self.doc.node_mut(id).kind {
                        add_doctype_parameter(doctype, span, &value);
                    }
                    self.set_end(id, span.end);
                }
            }
            TokenType::InternalDtdStart => {
                if let Some(id) = self.open_doctype {
                    if let NodeKind::DocumentType(doctype) = &mut self.doc.node_mut(id).kind {
                        doctype.subset_open = Some(span.start);
                    }
                    self.set_end(id, span.end);
                    self.in_subset = true;
                }
            }
            TokenType::InternalDtdEnd => {
                self.interrupt(false);
                if let Some(id) = self.open_doctype {
                    if let NodeKind::DocumentType(doctype) = &mut self.doc.node_mut(id).kind {
                        doctype.subset_close = Some(span.start);
                    }
                    self.set_end(id, span.end);
                }
                self.in_subset = false;
            }
            TokenType::EndDoctypeTag => {
                if let Some(id) = self.open_doctype.take() {
                    if let NodeKind::DocumentType(doctype) = &mut self.doc.node_mut(id).kind {
                        doctype.closed = true;
                    }
                    self.set_end(id, span.end);
                }
                self.in_subset = false;
            }
            TokenType::StartElementDecl
            | TokenType::StartAttlistDecl
            | TokenType::StartEntityDecl
            | TokenType::StartNotationDecl => {
                self.interrupt(false);
                let decl = Declaration {
                    keyword_end: span.end,
                    ..Default::default()
                };
                let kind = match token {
                    TokenType::StartElementDecl => NodeKind::ElementDecl(decl),
                    TokenType::StartAttlistDecl => NodeKind::AttlistDecl(decl),
                    TokenType::StartEntityDecl => NodeKind::EntityDecl(decl),
                    _ => NodeKind::NotationDecl(decl),
                };
                let parent = self.current_parent();
                self.open_leaf = Some(self.doc.add_node(parent, kind, span));
            }
            TokenType::DeclParameter => {
                if let Some(id) = self.open_leaf {
                    let value = self.text(span);
                    let node = self.doc.node_mut(id);
                    let is_entity = matches!(node.kind, NodeKind::EntityDecl(_));
                    if let NodeKind::ElementDecl(decl)
                    | NodeKind::AttlistDecl(decl)
                    | NodeKind::EntityDecl(decl)
                    | NodeKind::NotationDecl(decl) = &mut node.kind
                    {
                        decl.parameters.push(span);
                        // `<!ENTITY % name …>` declares a parameter entity
                        if decl.name.is_none() && !(is_entity && value == "%") {
                            decl.name = Some(value);
                        }
                    }
                    self.set_end(id, span.end);
                }
            }
            TokenType::EndDecl => {
                if let Some(id) = self.open_leaf.take() {
                    if let NodeKind::ElementDecl(decl)
                    | NodeKind::AttlistDecl(decl)
                    | NodeKind::EntityDecl(decl)
                    | NodeKind::NotationDecl(decl) = &mut self.doc.node_mut(id).kind
                    {
                        decl.closed = true;
                    }
                    self.set_end(id, span.end);
                }
            }
            TokenType::UnknownDecl => {
                self.interrupt(false);
                let closed = self.doc.slice(span).ends_with('>');
                let parent = self.current_parent();
                self.doc
                    .add_node(parent, NodeKind::UnknownDecl { closed }, span);
            }
            TokenType::DtdText => {
                self.interrupt(false);
                let parent = self.current_parent();
                self.doc.add_node(parent, NodeKind::DtdText, span);
            }
            TokenType::Unknown => {
                if let Some(owner) = self.attr_owner {
                    self.current_attribute = None;
                    self.extend_tag(owner, span.end);
                } else if let Some(id) = self.pending_end {
                    self.set_end(id, span.end);
                }
            }
            TokenType::Whitespace | TokenType::Eos => {}
        }
    }

    /// Record the end of a start tag's content so far
    fn extend_tag(&mut self, owner: NodeId, end: usize) {
        if let Some(element) = self.element_mut(owner) {
            element.start_tag_content_end = end;
        }
        self.set_end(owner, end);
    }

    /// Resolve `</name` against the open-element stack
    fn end_tag(&mut self, name_span: Span) {
        let Some(open) = self.end_tag_open.take() else {
            return;
        };
        let name = self.text(name_span);
        let matched = self
            .stack
            .iter()
            .rposition(|&id| self.doc.element_name(id) == Some(name.as_str()));
        match matched {
            Some(index) => {
                while self.stack.len() > index + 1 {
                    if let Some(skipped) = self.stack.pop() {
                        self.set_end(skipped, open);
                    }
                }
                if let Some(id) = self.stack.pop() {
                    if let Some(element) = self.element_mut(id) {
                        element.end_tag_open = Some(open);
                        element.end_tag_name = Some(name_span);
                        element.closed = true;
                    }
                    self.set_end(id, name_span.end);
                    self.pending_end = Some(id);
                }
            }
            None => {
                let id = self.orphan(Some(name_span), open, name_span.end, None);
                self.pending_end = Some(id);
            }
        }
    }

    /// Add an end tag that matched no open element
    fn orphan(
        &mut self,
        name_span: Option<Span>,
        open: usize,
        end: usize,
        close: Option<usize>,
    ) -> NodeId {
        let element = Element {
            name: name_span.map(|span| self.text(span)),
            start_tag_content_end: open,
            end_tag_open: Some(open),
            end_tag_name: name_span,
            end_tag_close: close,
            orphan_end_tag: true,
            ..Default::default()
        };
        let parent = self.current_parent();
        self.doc
            .add_node(parent, NodeKind::Element(element), Span::new(open, end))
    }

    /// Finalize constructs cut short by a new token
    ///
    /// `markup` is true for tokens that also end a DOCTYPE outside its
    /// internal subset.
    fn interrupt(&mut self, markup: bool) {
        self.attr_owner = None;
        self.current_attribute = None;
        self.pending_end = None;
        if let Some(open) = self.end_tag_open.take() {
            let end = self.last_token_end.max(open);
            self.orphan(None, open, end, None);
        }
        if let Some(id) = self.open_leaf.take() {
            self.set_end(id, self.last_token_end.max(self.doc.span(id).end));
        }
        if markup || !self.in_subset {
            if let Some(id) = self.open_doctype.take() {
                self.set_end(id, self.last_token_end.max(self.doc.span(id).end));
                self.in_subset = false;
            }
        }
    }

    fn finish(mut self) -> Document {
        self.interrupt(true);
        let len = self.doc.len();
        while let Some(id) = self.stack.pop() {
            self.set_end(id, len);
        }
        self.doc
    }
}

fn unquote(value: &str) -> &str {
    let mut chars = value.chars();
    match chars.next() {
        Some(q @ ('"' | '\'')) => {
            let inner = &value[1..];
            inner.strip_suffix(q).unwrap_or(inner)
        }
        _ => value,
    }
}

fn add_doctype_parameter(doctype: &mut DocumentType, span: Span, value: &str) {
    let index = doctype.parameters.len();
    doctype.parameters.push(span);
    match (index, doctype.external_kind) {
        (0, _) => doctype.name = Some(value.to_string()),
        (1, _) => {
            doctype.external_kind = match value {
                "PUBLIC" => Some(DocumentTypeKind::Public),
                "SYSTEM" => Some(DocumentTypeKind::System),
                _ => None,
            }
        }
        (2, Some(DocumentTypeKind::Public)) => doctype.public_id = Some(unquote(value).to_string()),
        (2, Some(DocumentTypeKind::System)) | (3, Some(DocumentTypeKind::Public)) => {
            doctype.system_id = Some(unquote(value).to_string())
        }
        _ => {}
    }
}

/// Parse `text` into a document tree
pub fn parse(text: &str, dialect: Dialect) -> Document {
    Parser::new(text, dialect).parse()
}

#[cfg(test)]
mod tests;
