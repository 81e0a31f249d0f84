//! Source spans, protocol positions and the line index
//!
//! Offsets are byte offsets into the UTF-8 source. Positions follow the
//! language server convention: zero-based line and a `character` counted
//! in UTF-16 code units. Line breaks are `\n`, `\r\n` and a lone `\r`.

use serde::Serialize;

use crate::error::{DomError, Result};

/// Half-open byte range `[start, end)` into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True when `offset` lies inside the half-open range
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// True when `other` lies entirely inside this span
    pub fn encloses(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Slice the span out of `text`, empty when the span is not valid for it
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or("")
    }
}

/// Zero-based line/character position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Start/end pair of positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Table of line start offsets, built once per document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Build the index for `text`
    pub fn new(text: &str) -> Self {
        let bytes = text.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    line_starts.push(i);
                }
                b'\r' | b'\n' => {
                    i += 1;
                    line_starts.push(i);
                }
                _ => i += 1,
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Number of lines (an empty text has one line)
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Offset at which `line` begins
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line).copied()
    }

    /// Line containing `offset`; offsets past the end map to the last line
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Offset just before the line break that ends `line`
    pub fn line_content_end(&self, text: &str, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(&next) => {
                let bytes = text.as_bytes();
                if next >= 2 && bytes[next - 2] == b'\r' && bytes[next - 1] == b'\n' {
                    next - 2
                } else {
                    next - 1
                }
            }
            None => self.len,
        }
    }

    /// Convert a byte offset into a line/character position
    pub fn position_at(&self, text: &str, offset: usize) -> Result<Position> {
        if offset > self.len {
            return Err(DomError::OffsetOutOfRange {
                offset,
                len: self.len,
            });
        }
        let mut offset = offset;
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_of(offset);
        let start = self.line_starts[line];
        let character: usize = text[start..offset].chars().map(char::len_utf16).sum();
        Ok(Position::new(line as u32, character as u32))
    }

    /// Convert a line/character position into a byte offset
    ///
    /// A character beyond the end of its line is clamped to the line end.
    pub fn offset_at(&self, text: &str, position: Position) -> Result<usize> {
        let line = position.line as usize;
        let Some(start) = self.line_start(line) else {
            return Err(DomError::PositionOutOfRange {
                line: position.line,
                character: position.character,
                line_count: self.line_count(),
            });
        };
        let end = self.line_content_end(text, line);
        let mut units = 0usize;
        for (i, ch) in text[start..end].char_indices() {
            if units >= position.character as usize {
                return Ok(start + i);
            }
            units += ch.len_utf16();
        }
        Ok(end)
    }

    /// Convert a span into a protocol range
    pub fn range_of(&self, text: &str, span: Span) -> Result<Range> {
        Ok(Range::new(
            self.position_at(text, span.start)?,
            self.position_at(text, span.end)?,
        ))
    }
}
