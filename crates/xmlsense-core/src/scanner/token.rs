//! Token types produced by the scanner

use serde::Serialize;
use xmlsense_dom::Span;

/// Kind of the last scanned token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    /// `<` opening a start tag
    StartTagOpen,
    /// Element name after `<`
    StartTag,
    /// `>` closing a start tag
    StartTagClose,
    /// `/>`
    StartTagSelfClose,
    /// `</`
    EndTagOpen,
    /// Element name after `</`
    EndTag,
    /// `>` closing an end tag
    EndTagClose,
    AttributeName,
    /// `=` between attribute name and value
    DelimiterAssign,
    /// Quoted or unquoted value, delimiters included
    AttributeValue,
    /// Character data between markup
    Content,
    Whitespace,
    /// `<!--`
    StartCommentTag,
    Comment,
    /// `-->`
    EndCommentTag,
    /// `<![CDATA[`
    CDataTagOpen,
    CDataContent,
    /// `]]>`
    CDataTagClose,
    /// `<?`
    StartPrologOrPi,
    /// `xml` after `<?`
    PrologName,
    /// Target name of a processing instruction
    PiName,
    /// Instruction body, trailing whitespace excluded
    PiContent,
    /// `?>` closing a processing instruction
    PiEnd,
    /// `?>` closing the prolog
    PrologEnd,
    /// `<!DOCTYPE`
    StartDoctypeTag,
    /// Name, keyword or quoted literal inside a DOCTYPE
    DoctypeParameter,
    /// `[`
    InternalDtdStart,
    /// `]`
    InternalDtdEnd,
    /// `>` closing a DOCTYPE
    EndDoctypeTag,
    /// `<!ELEMENT`
    StartElementDecl,
    /// `<!ATTLIST`
    StartAttlistDecl,
    /// `<!ENTITY`
    StartEntityDecl,
    /// `<!NOTATION`
    StartNotationDecl,
    /// Word, literal or parenthesized group inside a declaration
    DeclParameter,
    /// `>` closing a declaration
    EndDecl,
    /// `<…>` in a DTD that is not a known declaration
    UnknownDecl,
    /// Bare text in a DTD, trailing whitespace excluded
    DtdText,
    /// Bytes that fit nowhere
    Unknown,
    /// End of input
    Eos,
}

/// A token and its source span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenType,
    pub span: Span,
}
