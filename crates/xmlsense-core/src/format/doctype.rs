//! DOCTYPE declarations and the markup declarations of a DTD

use xmlsense_dom::{Declaration, DocumentType, NodeId, Span};

use super::category::ContentCategory;
use super::content::{Container, ContainerKind};
use super::edit::count_newlines;
use super::Context;
use crate::error::Result;

const DOCTYPE_KEYWORD: &str = "<!DOCTYPE";

impl<'a> Context<'a> {
    pub(crate) fn format_doctype(
        &mut self,
        id: NodeId,
        doctype: &DocumentType,
        level: usize,
    ) -> Result<()> {
        if !doctype.closed {
            return Ok(());
        }
        let doc = self.doc;
        let span = doc.span(id);
        let mut previous_end = (span.start + DOCTYPE_KEYWORD.len()).min(span.end);
        for &parameter in &doctype.parameters {
            self.format_parameter_gap(Span::new(previous_end, parameter.start), level);
            previous_end = parameter.end;
        }

        if let Some(open) = doctype.subset_open {
            self.replace_blank(Span::new(previous_end, open), " ");
            let close = doctype.subset_close;
            let subset = Container {
                id,
                kind: ContainerKind::Subset,
                content: Span::new(open + 1, close.unwrap_or(span.end).max(open + 1)),
                has_start: true,
                has_end: close.is_some(),
                level,
                child_level: level + 1,
                category: ContentCategory::IgnoreSpace,
            };
            self.format_content(&subset)?;
            let Some(close) = close else {
                return Ok(());
            };
            previous_end = close + 1;
        }

        let end = span.end.saturating_sub(1).max(previous_end);
        self.replace_blank(Span::new(previous_end, end), "");
        Ok(())
    }

    pub(crate) fn format_declaration(&mut self, id: NodeId, decl: &Declaration, level: usize) {
        if !decl.closed {
            return;
        }
        let mut previous_end = decl.keyword_end;
        for &parameter in &decl.parameters {
            self.format_parameter_gap(Span::new(previous_end, parameter.start), level);
            previous_end = parameter.end;
        }
        let end = self.doc.span(id).end.saturating_sub(1).max(previous_end);
        self.replace_blank(Span::new(previous_end, end), "");
    }

    /// Parameters are single-space separated; a parameter already on its
    /// own line stays there, one level deeper than the declaration
    fn format_parameter_gap(&mut self, gap: Span, level: usize) {
        if gap.is_empty() {
            return;
        }
        if count_newlines(self.doc.slice(gap)) > 0 {
            let text = self.newline_indent(level + 1);
            self.replace_blank(gap, &text);
        } else {
            self.replace_blank(gap, " ");
        }
    }
}
