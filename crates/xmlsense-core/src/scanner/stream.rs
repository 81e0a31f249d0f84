//! Byte cursor over the source text
//!
//! Delimiters are all ASCII, so every stop position found here is a UTF-8
//! character boundary. Searches use memchr.

use memchr::{memchr, memchr2, memmem};

#[derive(Debug, Clone)]
pub(crate) struct ByteStream<'a> {
    input: &'a [u8],
    pos: usize,
}

pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

pub(crate) fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':' || b >= 0x80
}

pub(crate) fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

impl<'a> ByteStream<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    #[inline]
    pub fn eos(&self) -> bool {
        self.pos >= self.input.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    pub fn peek_at(&self, n: usize) -> Option<u8> {
        self.input.get(self.pos + n).copied()
    }

    #[inline]
    fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.input.len());
    }

    /// Advance over one whole UTF-8 character
    pub fn advance_char(&mut self) {
        let Some(first) = self.peek() else {
            return;
        };
        let width = match first {
            0x00..=0x7F => 1,
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        self.advance(width);
        while self.peek().is_some_and(|b| (0x80..0xC0).contains(&b)) {
            self.pos += 1;
        }
    }

    pub fn starts_with(&self, bytes: &[u8]) -> bool {
        self.remaining().starts_with(bytes)
    }

    pub fn advance_if_byte(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn advance_if_bytes(&mut self, bytes: &[u8]) -> bool {
        if self.starts_with(bytes) {
            self.pos += bytes.len();
            true
        } else {
            false
        }
    }

    /// Skip spaces, tabs and line breaks; true when something was skipped
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    /// Advance over an XML name; returns its length
    pub fn advance_name(&mut self) -> usize {
        let start = self.pos;
        if !self.peek().is_some_and(is_name_start) {
            return 0;
        }
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Advance while `pred` holds; returns the number of bytes consumed
    pub fn advance_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Position of the next `b`, searching from the cursor
    pub fn find_byte(&self, b: u8) -> Option<usize> {
        memchr(b, self.remaining()).map(|i| self.pos + i)
    }

    pub fn find_byte2(&self, b1: u8, b2: u8) -> Option<usize> {
        memchr2(b1, b2, self.remaining()).map(|i| self.pos + i)
    }

    pub fn find_bytes(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    /// Move to the next `b`, or to the end; true when `b` was found
    pub fn advance_until_byte(&mut self, b: u8) -> bool {
        match self.find_byte(b) {
            Some(found) => {
                self.pos = found;
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        }
    }

    /// Move to the start of `needle`, or to the end
    pub fn advance_until_bytes(&mut self, needle: &[u8]) -> bool {
        match self.find_bytes(needle) {
            Some(found) => {
                self.pos = found;
                true
            }
            None => {
                self.pos = self.input.len();
                false
            }
        }
    }

    /// Last offset before `end` that is not whitespace, searching back to `start`
    pub fn trim_end(&self, start: usize, end: usize) -> usize {
        let mut end = end;
        while end > start && is_whitespace(self.input[end - 1]) {
            end -= 1;
        }
        end
    }
}
