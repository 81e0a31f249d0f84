//! Text edits and the collector that records them during a walk

use serde::Serialize;
use xmlsense_dom::{Document, Range, Span};

use crate::error::Result;

/// One contiguous replacement of `source[start..end]` by `new_text`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Apply edits to `text`
///
/// Edits are applied in `start` order; an edit overlapping one already
/// applied is ignored.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| edit.start);

    let mut result = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in ordered {
        if edit.start < cursor || edit.end > text.len() || edit.start > edit.end {
            continue;
        }
        result.push_str(&text[cursor..edit.start]);
        result.push_str(&edit.new_text);
        cursor = edit.end;
    }
    result.push_str(&text[cursor..]);
    result
}

pub(crate) fn is_blank(text: &str) -> bool {
    text.bytes().all(|byte| matches!(byte, b' ' | b'\t' | b'\r' | b'\n'))
}

pub(crate) fn count_newlines(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut count = 0;
    for (index, byte) in bytes.iter().enumerate() {
        match byte {
            b'\n' => count += 1,
            b'\r' if bytes.get(index + 1) != Some(&b'\n') => count += 1,
            _ => {}
        }
    }
    count
}

/// Equal once every `\r\n` and `\r` is read as `\n`
fn same_lines(a: &str, b: &str) -> bool {
    if !a.contains('\r') && !b.contains('\r') {
        return false;
    }
    let normalize = |text: &str| text.replace("\r\n", "\n").replace('\r', "\n");
    normalize(a) == normalize(b)
}

fn is_line_break(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

#[derive(Debug, Clone)]
struct PendingEdit {
    start: usize,
    end: usize,
    new_text: String,
}

/// Edits accepted so far, in document order
pub(crate) struct EditList<'a> {
    text: &'a str,
    range: Option<Span>,
    edits: Vec<PendingEdit>,
}

impl<'a> EditList<'a> {
    pub fn new(text: &'a str, range: Option<Span>) -> Self {
        Self {
            text,
            range,
            edits: Vec::new(),
        }
    }

    pub fn range(&self) -> Option<Span> {
        self.range
    }

    /// Record a replacement of `span`; no-ops and edits outside the range
    /// are dropped
    ///
    /// Text differing from `new_text` only in the style of its line breaks
    /// counts as a no-op.
    pub fn replace(&mut self, span: Span, new_text: &str) {
        let old = span.slice(self.text);
        if old == new_text || same_lines(old, new_text) {
            return;
        }
        let Some(range) = self.range else {
            self.push(span.start, span.end, new_text);
            return;
        };
        if range.encloses(span) {
            self.push(span.start, span.end, new_text);
            return;
        }

        // Narrow to the differing middle and keep it only when it is a
        // whitespace edit inside the range.
        let prefix = common_prefix(old, new_text);
        let suffix = common_suffix(&old[prefix..], &new_text[prefix..]);
        let start = span.start + prefix;
        let end = span.end - suffix;
        if range.encloses(Span::new(start, end)) && is_blank(&self.text[start..end]) {
            let narrowed = &new_text[prefix..new_text.len() - suffix];
            self.push(start, end, narrowed);
        }
    }

    fn push(&mut self, start: usize, end: usize, new_text: &str) {
        self.edits.push(PendingEdit {
            start,
            end,
            new_text: new_text.to_string(),
        });
    }

    /// Whether any accepted edit reaches strictly inside `span`
    pub fn overlaps(&self, span: Span) -> bool {
        self.edits
            .iter()
            .any(|edit| edit.start < span.end && span.start < edit.end.max(edit.start + 1))
    }

    /// Output column at `offset` once the accepted edits are applied
    pub fn column_at(&self, offset: usize) -> usize {
        let mut column = 0;
        let mut cursor = offset;
        for edit in self.edits.iter().rev() {
            if edit.end > cursor {
                continue;
            }
            let between = &self.text[edit.end..cursor];
            if let Some(index) = between.rfind(is_line_break) {
                return column + between[index + 1..].chars().count();
            }
            column += between.chars().count();
            if let Some(index) = edit.new_text.rfind(is_line_break) {
                return column + edit.new_text[index + 1..].chars().count();
            }
            column += edit.new_text.chars().count();
            cursor = edit.start;
        }
        let between = &self.text[..cursor];
        match between.rfind(is_line_break) {
            Some(index) => column + between[index + 1..].chars().count(),
            None => column + between.chars().count(),
        }
    }

    /// Sort by start and attach protocol ranges
    pub fn finish(mut self, doc: &Document) -> Result<Vec<TextEdit>> {
        self.edits.sort_by_key(|edit| edit.start);
        self.edits
            .into_iter()
            .map(|edit| {
                Ok(TextEdit {
                    start: edit.start,
                    end: edit.end,
                    range: doc.range_of(Span::new(edit.start, edit.end))?,
                    new_text: edit.new_text,
                })
            })
            .collect()
    }
}

fn common_prefix(a: &str, b: &str) -> usize {
    let mut length = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(length) || !b.is_char_boundary(length) {
        length -= 1;
    }
    length
}

fn common_suffix(a: &str, b: &str) -> usize {
    let mut length = a
        .bytes()
        .rev()
        .zip(b.bytes().rev())
        .take_while(|(x, y)| x == y)
        .count();
    while !a.is_char_boundary(a.len() - length) || !b.is_char_boundary(b.len() - length) {
        length -= 1;
    }
    length
}
