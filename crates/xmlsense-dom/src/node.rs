//! Node kinds stored in the document arena
//!
//! Every node records its byte span and the offsets of the delimiters the
//! formatter and editor features need, so no consumer has to re-scan the
//! source text.

use serde::Serialize;

use crate::position::Span;

/// Index of a node inside its [`Document`](crate::Document) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The document root
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

/// One entry of the arena
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

/// Tagged union over everything the tree builder produces
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    Document,
    Element(Element),
    /// Held in the owner's attribute list, never in `children`
    Attribute(Attribute),
    /// Character data; the span includes surrounding whitespace
    Text,
    #[serde(rename = "cdata")]
    CData(CharacterData),
    Comment(CharacterData),
    ProcessingInstruction(ProcessingInstruction),
    DocumentType(DocumentType),
    ElementDecl(Declaration),
    AttlistDecl(Declaration),
    EntityDecl(Declaration),
    NotationDecl(Declaration),
    /// `<!…>` markup with an unrecognized keyword
    UnknownDecl { closed: bool },
    /// Bare text inside a DTD, such as a parameter entity reference
    DtdText,
}

impl NodeKind {
    /// Short lowercase name used in logs and tree dumps
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Element(_) => "element",
            NodeKind::Attribute(_) => "attribute",
            NodeKind::Text => "text",
            NodeKind::CData(_) => "cdata",
            NodeKind::Comment(_) => "comment",
            NodeKind::ProcessingInstruction(_) => "processingInstruction",
            NodeKind::DocumentType(_) => "documentType",
            NodeKind::ElementDecl(_) => "elementDecl",
            NodeKind::AttlistDecl(_) => "attlistDecl",
            NodeKind::EntityDecl(_) => "entityDecl",
            NodeKind::NotationDecl(_) => "notationDecl",
            NodeKind::UnknownDecl { .. } => "unknownDecl",
            NodeKind::DtdText => "dtdText",
        }
    }

    /// Declaration payload for the four markup declaration kinds
    pub fn declaration(&self) -> Option<&Declaration> {
        match self {
            NodeKind::ElementDecl(decl)
            | NodeKind::AttlistDecl(decl)
            | NodeKind::EntityDecl(decl)
            | NodeKind::NotationDecl(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::DtdText)
    }
}

/// An element, an orphan end tag, or a bare `<` with no name
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub name: Option<String>,
    pub name_span: Option<Span>,
    pub attributes: Vec<NodeId>,
    /// Offset of the `>` or `/>` that closes the start tag
    pub start_tag_close: Option<usize>,
    /// End of the last non-whitespace token inside the start tag
    pub start_tag_content_end: usize,
    pub self_closed: bool,
    /// Offset of the `</` of the end tag
    pub end_tag_open: Option<usize>,
    pub end_tag_name: Option<Span>,
    /// Offset of the `>` closing the end tag
    pub end_tag_close: Option<usize>,
    /// Self-closed, or closed by an end tag with a matching name
    pub closed: bool,
    /// An end tag that matched no open element
    pub orphan_end_tag: bool,
}

impl Element {
    /// True once the start tag has its `>` or `/>`
    pub fn start_tag_closed(&self) -> bool {
        self.start_tag_close.is_some()
    }

    pub fn has_end_tag(&self) -> bool {
        self.end_tag_open.is_some()
    }

    /// Closed by a complete `</name>` end tag
    pub fn has_complete_end_tag(&self) -> bool {
        self.end_tag_close.is_some()
    }
}

/// A `name`, `name=value` or `name="value"` attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    pub name_span: Span,
    /// Offset of the `=` sign
    pub assign: Option<usize>,
    pub value: Option<AttributeValue>,
}

impl Attribute {
    /// Value text without its delimiters
    pub fn value_text<'a>(&self, source: &'a str) -> Option<&'a str> {
        self.value.as_ref().map(|value| value.text(source))
    }
}

/// Raw attribute value; the span includes the delimiters when present
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeValue {
    pub span: Span,
    pub quote: Option<char>,
    /// Quoted value with a matching closing delimiter
    pub closed: bool,
}

impl AttributeValue {
    pub fn has_delimiters(&self) -> bool {
        self.quote.is_some()
    }

    /// Span of the value without its delimiters
    pub fn content_span(&self) -> Span {
        if self.quote.is_none() {
            return self.span;
        }
        let start = (self.span.start + 1).min(self.span.end);
        let end = if self.closed {
            self.span.end.saturating_sub(1).max(start)
        } else {
            self.span.end
        };
        Span::new(start, end)
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.content_span().slice(source)
    }
}

/// Payload shared by comments and CDATA sections
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterData {
    pub content: Span,
    pub closed: bool,
}

/// `<?target …?>`; the `<?xml …?>` prolog carries pseudo-attributes
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingInstruction {
    pub target: Option<String>,
    pub target_span: Option<Span>,
    pub prolog: bool,
    pub attributes: Vec<NodeId>,
    /// Trimmed instruction body of a non-prolog PI
    pub content: Option<Span>,
    pub closed: bool,
}

/// External identifier kind of a DOCTYPE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentTypeKind {
    Public,
    System,
}

/// `<!DOCTYPE name PUBLIC "…" "…" [ … ]>`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub name: Option<String>,
    pub external_kind: Option<DocumentTypeKind>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    /// Every parameter token in source order, the name included
    pub parameters: Vec<Span>,
    /// Offset of `[`
    pub subset_open: Option<usize>,
    /// Offset of `]`
    pub subset_close: Option<usize>,
    pub closed: bool,
}

/// `<!ELEMENT`, `<!ATTLIST`, `<!ENTITY` and `<!NOTATION` declarations
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub name: Option<String>,
    /// End of the `<!KEYWORD` opener
    pub keyword_end: usize,
    /// Parameter tokens in source order, the name included
    pub parameters: Vec<Span>,
    pub closed: bool,
}
