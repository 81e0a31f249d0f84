//! End-of-line and end-of-document whitespace

use xmlsense_dom::Span;

use super::Context;

impl<'a> Context<'a> {
    /// Final pass after the tree walk; newline handling at the end of the
    /// document only applies when the whole document is formatted
    pub(crate) fn finish_document(&mut self, whole_document: bool) {
        if whole_document {
            let ends_with_break = self.trim_final_newlines();
            if !ends_with_break {
                self.insert_final_newline();
            }
        }
        if self.settings.trim_trailing_whitespace {
            self.trim_trailing_whitespace();
        }
    }

    /// Returns whether the output ends with a line break afterwards
    fn trim_final_newlines(&mut self) -> bool {
        let text = self.doc.text();
        let ends_with_break = text.ends_with(['\r', '\n']);
        if !self.settings.trim_final_newlines {
            return ends_with_break;
        }
        let content_end = text.trim_end_matches([' ', '\t', '\r', '\n']).len();
        let Some(first_break) = text[content_end..].find(['\r', '\n']) else {
            return ends_with_break;
        };
        let mut keep = content_end + first_break;
        if self.settings.insert_final_newline {
            keep += if text[keep..].starts_with("\r\n") { 2 } else { 1 };
        }
        let span = Span::new(keep, text.len());
        if span.is_empty() || self.overlaps_edit(span) {
            return ends_with_break;
        }
        self.edits.replace(span, "");
        self.settings.insert_final_newline
    }

    fn insert_final_newline(&mut self) {
        let text = self.doc.text();
        if !self.settings.insert_final_newline || text.is_empty() {
            return;
        }
        let end = Span::new(text.len(), text.len());
        self.edits.replace(end, self.delimiter);
    }

    fn trim_trailing_whitespace(&mut self) {
        let doc = self.doc;
        let text = doc.text();
        let lines = doc.line_index();
        for line in 0..lines.line_count() {
            let Some(start) = lines.line_start(line) else {
                break;
            };
            let end = lines.line_content_end(text, line).max(start);
            let content = &text[start..end];
            let trimmed = content.trim_end_matches([' ', '\t']).len();
            let span = Span::new(start + trimmed, end);
            if span.is_empty() || self.is_protected(span) || self.overlaps_edit(span) {
                continue;
            }
            self.edits.replace(span, "");
        }
    }

    fn is_protected(&self, span: Span) -> bool {
        self.protected
            .iter()
            .any(|protected| protected.start < span.end && span.start < protected.end)
    }

    fn overlaps_edit(&self, span: Span) -> bool {
        self.edits.overlaps(span)
    }
}
