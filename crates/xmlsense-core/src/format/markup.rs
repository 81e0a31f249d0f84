//! Comments, CDATA sections and processing instructions

use xmlsense_dom::{CharacterData, NodeId, ProcessingInstruction, Span};

use super::category::ContentCategory;
use super::edit::count_newlines;
use super::Context;

/// Position of a whitespace run inside character data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPosition {
    Leading,
    Interior,
    Trailing,
}

/// Whitespace runs of `span`, each with the width of the word after it
fn whitespace_runs(text: &str, span: Span) -> Vec<(Span, RunPosition, usize)> {
    let bytes = text.as_bytes().get(span.start..span.end).unwrap_or_default();
    let is_space = |byte: u8| matches!(byte, b' ' | b'\t' | b'\r' | b'\n');
    let mut runs = Vec::new();
    let mut index = 0;
    while index < bytes.len() {
        if !is_space(bytes[index]) {
            index += 1;
            continue;
        }
        let start = index;
        while index < bytes.len() && is_space(bytes[index]) {
            index += 1;
        }
        let word_end = bytes[index..]
            .iter()
            .position(|&byte| is_space(byte))
            .map_or(bytes.len(), |offset| index + offset);
        let word = std::str::from_utf8(&bytes[index..word_end]).unwrap_or_default();
        let position = if start == 0 {
            RunPosition::Leading
        } else if index == bytes.len() {
            RunPosition::Trailing
        } else {
            RunPosition::Interior
        };
        runs.push((
            Span::new(span.start + start, span.start + index),
            position,
            word.chars().count(),
        ));
    }
    runs
}

impl<'a> Context<'a> {
    pub(crate) fn format_comment(&mut self, data: CharacterData, level: usize) {
        let settings = self.settings;
        if !data.closed || !settings.format_comments || !settings.join_comment_lines {
            return;
        }
        for (run, position, width) in whitespace_runs(self.doc.text(), data.content) {
            let source = self.doc.slice(run);
            match position {
                RunPosition::Leading | RunPosition::Trailing => {
                    if count_newlines(source) > 0 {
                        self.edits.replace(run, " ");
                    }
                }
                RunPosition::Interior => {
                    if self.exceeds_width(run.start, width, level) {
                        let text = self.newline_indent(level);
                        self.edits.replace(run, &text);
                    } else {
                        self.edits.replace(run, " ");
                    }
                }
            }
        }
    }

    pub(crate) fn format_cdata(&mut self, data: CharacterData, parent: ContentCategory) {
        if !data.closed {
            return;
        }
        if !self.settings.join_cdata_lines || parent == ContentCategory::PreserveSpace {
            self.protected.push(data.content);
            return;
        }
        for (run, position, _) in whitespace_runs(self.doc.text(), data.content) {
            match position {
                RunPosition::Leading | RunPosition::Trailing => self.edits.replace(run, ""),
                RunPosition::Interior => self.edits.replace(run, " "),
            }
        }
    }

    /// Prolog pseudo-attributes are single-space separated; the body of any
    /// other instruction is left alone
    pub(crate) fn format_processing_instruction(
        &mut self,
        id: NodeId,
        pi: &ProcessingInstruction,
    ) {
        if let Some(content) = pi.content {
            self.protected.push(content);
        }
        if !pi.closed || !pi.prolog {
            return;
        }
        let Some(target) = pi.target_span else {
            return;
        };
        let doc = self.doc;
        let mut previous_end = target.end;
        for &attribute in &pi.attributes {
            let span = doc.span(attribute);
            self.replace_blank(Span::new(previous_end, span.start), " ");
            self.format_attribute(attribute);
            previous_end = span.end;
        }
        let end = doc.span(id).end.saturating_sub(2).max(previous_end);
        self.replace_blank(Span::new(previous_end, end), "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_run_positions() {
        let text = "\n a  bc \n";
        let runs = whitespace_runs(text, Span::new(0, text.len()));
        assert_eq!(
            runs,
            vec![
                (Span::new(0, 2), RunPosition::Leading, 1),
                (Span::new(3, 5), RunPosition::Interior, 2),
                (Span::new(7, 9), RunPosition::Trailing, 0),
            ]
        );
    }
}
