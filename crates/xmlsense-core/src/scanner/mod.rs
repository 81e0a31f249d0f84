//! Tolerant XML scanner
//!
//! A single-pass state machine that splits source text into positioned
//! tokens. It never fails: malformed input produces `Unknown` tokens or
//! shorter constructs, and every call to [`Scanner::scan_token`] either
//! advances or returns [`TokenType::Eos`].
//!
//! # Example
//!
//! ```
//! use xmlsense_core::scanner::{Scanner, ScannerState, TokenType};
//!
//! let mut scanner = Scanner::new("<a b='c'/>", ScannerState::WithinContent);
//! assert_eq!(scanner.scan_token(), TokenType::StartTagOpen);
//! assert_eq!(scanner.scan_token(), TokenType::StartTag);
//! assert_eq!(scanner.token_text(), "a");
//! ```

mod state;
mod stream;
mod token;


pub use state::ScannerState;
pub use token::{Token, TokenType};

use xmlsense_dom::{Dialect, Span};

use stream::{is_name_start, is_whitespace, ByteStream};

/// Markup declaration keywords recognized in a DTD
const DECLARATIONS: [(&[u8], TokenType); 4] = [
    (b"<!ELEMENT", TokenType::StartElementDecl),
    (b"<!ATTLIST", TokenType::StartAttlistDecl),
    (b"<!ENTITY", TokenType::StartEntityDecl),
    (b"<!NOTATION", TokenType::StartNotationDecl),
];

/// Tolerant XML tokenizer
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    stream: ByteStream<'a>,
    state: ScannerState,
    token_offset: usize,
    token_type: TokenType,
    /// Whitespace seen since the last name or value inside a tag
    had_whitespace: bool,
    in_prolog: bool,
    in_internal_dtd: bool,
    dtd_file: bool,
    finished: bool,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner starting in `state`
    pub fn new(text: &'a str, state: ScannerState) -> Self {
        Self {
            text,
            stream: ByteStream::new(text),
            state,
            token_offset: 0,
            token_type: TokenType::Unknown,
            had_whitespace: false,
            in_prolog: false,
            in_internal_dtd: state == ScannerState::WithinInternalDtd,
            dtd_file: false,
            finished: false,
        }
    }

    /// Create a scanner for the top-level grammar of `dialect`
    ///
    /// DTD files start inside the declaration list and treat `]` as text.
    pub fn for_dialect(text: &'a str, dialect: Dialect) -> Self {
        match dialect {
            Dialect::Xml => Self::new(text, ScannerState::WithinContent),
            Dialect::Dtd => {
                let mut scanner = Self::new(text, ScannerState::WithinInternalDtd);
                scanner.dtd_file = true;
                scanner
            }
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    pub fn token_offset(&self) -> usize {
        self.token_offset
    }

    pub fn token_end(&self) -> usize {
        self.stream.pos()
    }

    pub fn token_span(&self) -> Span {
        Span::new(self.token_offset, self.stream.pos())
    }

    pub fn token_text(&self) -> &'a str {
        self.token_span().slice(self.text)
    }

    /// Scan the next token
    pub fn scan_token(&mut self) -> TokenType {
        let offset = self.stream.pos();
        let token = self.internal_scan();
        if token != TokenType::Eos && offset == self.stream.pos() {
            // No rule consumed input: skip one character so scanning terminates
            self.stream.advance_char();
            return self.finish(offset, TokenType::Unknown);
        }
        token
    }

    fn finish(&mut self, offset: usize, token_type: TokenType) -> TokenType {
        self.token_offset = offset;
        self.token_type = token_type;
        token_type
    }

    /// State to return to after a comment, PI or unknown markup
    fn content_state(&self) -> ScannerState {
        if self.in_internal_dtd {
            ScannerState::WithinInternalDtd
        } else {
            ScannerState::WithinContent
        }
    }

    fn internal_scan(&mut self) -> TokenType {
        let offset = self.stream.pos();
        if self.stream.eos() {
            return self.finish(offset, TokenType::Eos);
        }
        loop {
            match self.state {
                ScannerState::WithinContent => {
                    if self.stream.advance_if_byte(b'<') {
                        if self.stream.advance_if_bytes(b"!--") {
                            self.state = ScannerState::WithinComment;
                            return self.finish(offset, TokenType::StartCommentTag);
                        }
                        if self.stream.advance_if_bytes(b"![CDATA[") {
                            self.state = ScannerState::WithinCData;
                            return self.finish(offset, TokenType::CDataTagOpen);
                        }
                        if self.stream.advance_if_bytes(b"!DOCTYPE") {
                            self.state = ScannerState::WithinDoctype;
                            return self.finish(offset, TokenType::StartDoctypeTag);
                        }
                        if self.stream.advance_if_byte(b'?') {
                            self.state = ScannerState::PrologOrPi;
                            return self.finish(offset, TokenType::StartPrologOrPi);
                        }
                        if self.stream.advance_if_byte(b'/') {
                            self.state = ScannerState::AfterOpeningEndTag;
                            return self.finish(offset, TokenType::EndTagOpen);
                        }
                        self.state = ScannerState::AfterOpeningStartTag;
                        return self.finish(offset, TokenType::StartTagOpen);
                    }
                    self.stream.advance_until_byte(b'<');
                    return self.finish(offset, TokenType::Content);
                }

                ScannerState::AfterOpeningStartTag => {
                    self.had_whitespace = false;
                    self.state = ScannerState::WithinTag;
                    if self.stream.advance_name() > 0 {
                        return self.finish(offset, TokenType::StartTag);
                    }
                }

                ScannerState::WithinTag => {
                    if self.stream.skip_whitespace() {
                        self.had_whitespace = true;
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    if self.in_prolog && self.stream.advance_if_bytes(b"?>") {
                        self.in_prolog = false;
                        self.state = self.content_state();
                        return self.finish(offset, TokenType::PrologEnd);
                    }
                    if self.had_whitespace && self.advance_attribute_name() {
                        self.had_whitespace = false;
                        self.state = ScannerState::AfterAttributeName;
                        return self.finish(offset, TokenType::AttributeName);
                    }
                    if !self.in_prolog {
                        if self.stream.advance_if_bytes(b"/>") {
                            self.state = ScannerState::WithinContent;
                            return self.finish(offset, TokenType::StartTagSelfClose);
                        }
                        if self.stream.advance_if_byte(b'>') {
                            self.state = ScannerState::WithinContent;
                            return self.finish(offset, TokenType::StartTagClose);
                        }
                    }
                    if self.stream.peek() == Some(b'<') {
                        self.in_prolog = false;
                        self.state = self.content_state();
                        continue;
                    }
                    self.had_whitespace = false;
                    self.advance_junk();
                    return self.finish(offset, TokenType::Unknown);
                }

                ScannerState::AfterAttributeName => {
                    if self.stream.skip_whitespace() {
                        self.had_whitespace = true;
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    if self.stream.advance_if_byte(b'=') {
                        self.state = ScannerState::BeforeAttributeValue;
                        return self.finish(offset, TokenType::DelimiterAssign);
                    }
                    self.state = ScannerState::WithinTag;
                }

                ScannerState::BeforeAttributeValue => {
                    if self.stream.skip_whitespace() {
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    self.state = ScannerState::WithinTag;
                    self.had_whitespace = false;
                    if matches!(self.stream.peek(), Some(b'"' | b'\'')) {
                        self.advance_quoted();
                        return self.finish(offset, TokenType::AttributeValue);
                    }
                    if self.advance_unquoted_value() {
                        return self.finish(offset, TokenType::AttributeValue);
                    }
                }

                ScannerState::AfterOpeningEndTag => {
                    self.state = ScannerState::WithinEndTag;
                    if self.stream.advance_name() > 0 {
                        return self.finish(offset, TokenType::EndTag);
                    }
                }

                ScannerState::WithinEndTag => {
                    if self.stream.skip_whitespace() {
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    if self.stream.advance_if_byte(b'>') {
                        self.state = ScannerState::WithinContent;
                        return self.finish(offset, TokenType::EndTagClose);
                    }
                    if self.stream.peek() == Some(b'<') {
                        self.state = ScannerState::WithinContent;
                        continue;
                    }
                    self.stream.advance_char();
                    self.stream
                        .advance_while(|b| !is_whitespace(b) && b != b'>' && b != b'<');
                    return self.finish(offset, TokenType::Unknown);
                }

                ScannerState::WithinComment => {
                    if self.stream.advance_if_bytes(b"-->") {
                        self.state = self.content_state();
                        return self.finish(offset, TokenType::EndCommentTag);
                    }
                    self.stream.advance_until_bytes(b"-->");
                    return self.finish(offset, TokenType::Comment);
                }

                ScannerState::WithinCData => {
                    if self.stream.advance_if_bytes(b"]]>") {
                        self.state = ScannerState::WithinContent;
                        return self.finish(offset, TokenType::CDataTagClose);
                    }
                    self.stream.advance_until_bytes(b"]]>");
                    return self.finish(offset, TokenType::CDataContent);
                }

                ScannerState::PrologOrPi => {
                    if self.stream.advance_if_bytes(b"?>") {
                        self.state = self.content_state();
                        return self.finish(offset, TokenType::PiEnd);
                    }
                    if self.stream.advance_name() > 0 {
                        if &self.text[offset..self.stream.pos()] == "xml" {
                            self.in_prolog = true;
                            self.had_whitespace = false;
                            self.state = ScannerState::WithinTag;
                            return self.finish(offset, TokenType::PrologName);
                        }
                        self.state = ScannerState::WithinPi;
                        return self.finish(offset, TokenType::PiName);
                    }
                    self.state = ScannerState::WithinPi;
                }

                ScannerState::WithinPi => {
                    if self.stream.skip_whitespace() {
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    if self.stream.advance_if_bytes(b"?>") {
                        self.state = self.content_state();
                        return self.finish(offset, TokenType::PiEnd);
                    }
                    let close = self.stream.find_bytes(b"?>");
                    let next_tag = self.stream.find_byte(b'<');
                    let stop = match (close, next_tag) {
                        (Some(c), Some(t)) if c < t => c,
                        (Some(c), None) => c,
                        (_, Some(t)) => t,
                        (None, None) => self.stream.len(),
                    };
                    if close != Some(stop) {
                        self.state = self.content_state();
                    }
                    let end = self.stream.trim_end(offset, stop);
                    if end == offset {
                        continue;
                    }
                    self.stream.set_pos(end);
                    return self.finish(offset, TokenType::PiContent);
                }

                ScannerState::WithinDoctype => {
                    if self.stream.skip_whitespace() {
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    if self.stream.advance_if_byte(b'[') {
                        self.in_internal_dtd = true;
                        self.state = ScannerState::WithinInternalDtd;
                        return self.finish(offset, TokenType::InternalDtdStart);
                    }
                    if self.stream.advance_if_byte(b'>') {
                        self.state = ScannerState::WithinContent;
                        return self.finish(offset, TokenType::EndDoctypeTag);
                    }
                    if self.stream.peek() == Some(b'<') {
                        self.state = ScannerState::WithinContent;
                        continue;
                    }
                    if matches!(self.stream.peek(), Some(b'"' | b'\'')) {
                        self.advance_quoted();
                    } else {
                        self.stream.advance_char();
                        self.stream.advance_while(|b| {
                            !is_whitespace(b) && !matches!(b, b'>' | b'<' | b'[' | b'"' | b'\'')
                        });
                    }
                    return self.finish(offset, TokenType::DoctypeParameter);
                }

                ScannerState::WithinInternalDtd => {
                    if self.stream.skip_whitespace() {
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    if !self.dtd_file && self.stream.advance_if_byte(b']') {
                        self.in_internal_dtd = false;
                        self.state = ScannerState::WithinDoctype;
                        return self.finish(offset, TokenType::InternalDtdEnd);
                    }
                    if self.stream.advance_if_bytes(b"<!--") {
                        self.state = ScannerState::WithinComment;
                        return self.finish(offset, TokenType::StartCommentTag);
                    }
                    if self.stream.advance_if_bytes(b"<?") {
                        self.state = ScannerState::PrologOrPi;
                        return self.finish(offset, TokenType::StartPrologOrPi);
                    }
                    if let Some(token) = self.advance_declaration_keyword() {
                        self.state = ScannerState::WithinDeclaration;
                        return self.finish(offset, token);
                    }
                    if self.stream.peek() == Some(b'<') {
                        self.advance_unknown_declaration();
                        return self.finish(offset, TokenType::UnknownDecl);
                    }
                    let stop = if self.dtd_file {
                        self.stream.find_byte(b'<')
                    } else {
                        self.stream.find_byte2(b'<', b']')
                    };
                    let stop = stop.unwrap_or(self.stream.len());
                    let end = self.stream.trim_end(offset, stop);
                    self.stream.set_pos(end);
                    return self.finish(offset, TokenType::DtdText);
                }

                ScannerState::WithinDeclaration => {
                    if self.stream.skip_whitespace() {
                        return self.finish(offset, TokenType::Whitespace);
                    }
                    if self.stream.advance_if_byte(b'>') {
                        self.state = ScannerState::WithinInternalDtd;
                        return self.finish(offset, TokenType::EndDecl);
                    }
                    let peek = self.stream.peek();
                    if peek == Some(b'<') || (!self.dtd_file && peek == Some(b']')) {
                        self.state = ScannerState::WithinInternalDtd;
                        continue;
                    }
                    match peek {
                        Some(quote @ (b'"' | b'\'')) => {
                            self.stream.advance(1);
                            if self.stream.advance_until_byte(quote) {
                                self.stream.advance(1);
                            }
                        }
                        Some(b'(') => self.advance_group(),
                        _ => {
                            let dtd_file = self.dtd_file;
                            self.stream.advance_char();
                            self.stream.advance_while(|b| {
                                !is_whitespace(b)
                                    && !matches!(b, b'>' | b'<' | b'(' | b'"' | b'\'')
                                    && (dtd_file || b != b']')
                            });
                        }
                    }
                    return self.finish(offset, TokenType::DeclParameter);
                }
            }
        }
    }

    /// Attribute names are lenient: anything up to a delimiter
    fn advance_attribute_name(&mut self) -> bool {
        self.stream.advance_while(|b| {
            !is_whitespace(b) && !matches!(b, b'"' | b'\'' | b'>' | b'<' | b'/' | b'=')
        }) > 0
    }

    fn advance_unquoted_value(&mut self) -> bool {
        let start = self.stream.pos();
        while let Some(b) = self.stream.peek() {
            if is_whitespace(b) || matches!(b, b'>' | b'<' | b'"' | b'\'' | b'=' | b'`') {
                break;
            }
            if b == b'/' && self.stream.peek_at(1) == Some(b'>') {
                break;
            }
            self.stream.advance(1);
        }
        self.stream.pos() > start
    }

    /// Consume a quoted string inside a tag or DOCTYPE
    ///
    /// Without a closing quote before the next `<`, the string stops before
    /// the first `>` that precedes that `<`, or before the `<` itself.
    fn advance_quoted(&mut self) {
        let Some(quote) = self.stream.peek() else {
            return;
        };
        self.stream.advance(1);
        let close = self.stream.find_byte(quote);
        let next_tag = self.stream.find_byte(b'<');
        match (close, next_tag) {
            (Some(c), Some(t)) if c < t => self.stream.set_pos(c + 1),
            (Some(c), None) => self.stream.set_pos(c + 1),
            (_, limit) => {
                let limit = limit.unwrap_or(self.stream.len());
                match self.stream.find_byte(b'>') {
                    Some(gt) if gt < limit => self.stream.set_pos(gt),
                    _ => self.stream.set_pos(limit),
                }
            }
        }
    }

    /// Stray characters inside a tag, up to the next delimiter
    fn advance_junk(&mut self) {
        if matches!(self.stream.peek(), Some(b'"' | b'\'')) {
            self.advance_quoted();
            return;
        }
        self.stream.advance_char();
        self.stream.advance_while(|b| {
            !is_whitespace(b) && !matches!(b, b'>' | b'/' | b'<' | b'"' | b'\'')
        });
    }

    fn advance_declaration_keyword(&mut self) -> Option<TokenType> {
        for (keyword, token) in DECLARATIONS {
            if self.stream.starts_with(keyword) {
                // `<!ELEMENTS` is not `<!ELEMENT`
                let after = self.stream.peek_at(keyword.len());
                if after.is_some_and(|b| is_name_start(b) || b.is_ascii_digit()) {
                    return None;
                }
                self.stream.advance(keyword.len());
                return Some(token);
            }
        }
        None
    }

    /// `<…>` markup in a DTD that is not a recognized declaration
    fn advance_unknown_declaration(&mut self) {
        self.stream.advance(1);
        let close = self.stream.find_byte(b'>');
        let next_tag = self.stream.find_byte(b'<');
        match (close, next_tag) {
            (Some(c), Some(t)) if c < t => self.stream.set_pos(c + 1),
            (Some(c), None) => self.stream.set_pos(c + 1),
            (_, Some(t)) => self.stream.set_pos(t),
            (None, None) => self.stream.set_pos(self.stream.len()),
        }
    }

    /// A parenthesized content model plus its occurrence indicator
    fn advance_group(&mut self) {
        let mut depth = 0usize;
        while let Some(b) = self.stream.peek() {
            match b {
                b'(' => depth += 1,
                b')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.stream.advance(1);
                        break;
                    }
                }
                b'>' | b'<' => return,
                _ => {}
            }
            self.stream.advance(1);
        }
        if matches!(self.stream.peek(), Some(b'*' | b'+' | b'?')) {
            self.stream.advance(1);
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let kind = self.scan_token();
        if kind == TokenType::Eos {
            self.finished = true;
            return None;
        }
        Some(Token {
            kind,
            span: self.token_span(),
        })
    }
}
