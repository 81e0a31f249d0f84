//! Start tags, attributes, end tags and empty elements

use xmlsense_dom::{Element, NodeId, NodeKind, Span};

use super::category::{classify, ContentCategory};
use super::content::{Container, ContainerKind};
use super::edit::{count_newlines, is_blank};
use super::settings::EmptyElements;
use super::Context;
use crate::error::Result;

impl<'a> Context<'a> {
    pub(crate) fn format_element(
        &mut self,
        id: NodeId,
        level: usize,
        parent: ContentCategory,
    ) -> Result<()> {
        let doc = self.doc;
        let Some(element) = doc.element(id) else {
            return Ok(());
        };
        if element.orphan_end_tag {
            self.format_end_tag(element);
            return Ok(());
        }

        let span = doc.span(id);
        let category = classify(doc, id, element, parent, self.settings, self.provider);
        if element.name.is_some() && element.start_tag_closed() {
            let rewritten = self.format_start_tag(id, element, span, level, category);
            if rewritten {
                return Ok(());
            }
        }
        if element.self_closed {
            return Ok(());
        }

        let content_start = match element.start_tag_close {
            Some(close) => close + 1,
            None => element.start_tag_content_end,
        };
        let content_end = element.end_tag_open.unwrap_or(span.end).max(content_start);
        let content = Span::new(content_start, content_end);
        let child_level = if element.closed { level + 1 } else { level };

        if category == ContentCategory::PreserveSpace {
            self.protected.push(content);
            self.visit_preserved(id, child_level)?;
        } else {
            let container = Container {
                id,
                kind: ContainerKind::Element,
                content,
                has_start: element.start_tag_closed(),
                has_end: element.has_end_tag(),
                level,
                child_level,
                category,
            };
            self.format_content(&container)?;
        }

        self.format_end_tag(element);
        Ok(())
    }

    /// Look inside preserved content for elements that opt back in with
    /// `xml:space="default"`
    fn visit_preserved(&mut self, id: NodeId, level: usize) -> Result<()> {
        let doc = self.doc;
        for &child in doc.children(id) {
            let Some(element) = doc.element(child) else {
                continue;
            };
            let preserve = ContentCategory::PreserveSpace;
            let category = classify(doc, child, element, preserve, self.settings, self.provider);
            if category == preserve {
                self.visit_preserved(child, level + 1)?;
            } else if self.meets_range(doc.span(child)) {
                self.format_node(child, level, preserve)?;
            }
        }
        Ok(())
    }

    /// Returns true when the tail of the element was rewritten as a whole
    fn format_start_tag(
        &mut self,
        id: NodeId,
        element: &Element,
        span: Span,
        level: usize,
        category: ContentCategory,
    ) -> bool {
        let doc = self.doc;
        let settings = self.settings;
        let (Some(name_span), Some(close)) = (element.name_span, element.start_tag_close) else {
            return false;
        };

        let attributes = doc.attributes(id);
        let split = settings.split_attributes && attributes.len() > 1;
        let split_level = level + settings.split_attributes_indent_size;
        let mut previous_end = name_span.end;
        for &attribute in attributes {
            let attribute_span = doc.span(attribute);
            let gap = Span::new(previous_end, attribute_span.start);
            let source = doc.slice(gap);
            let text = if settings.preserve_attribute_line_breaks && count_newlines(source) > 0 {
                self.newline_indent(if split { split_level } else { level + 1 })
            } else if split {
                self.newline_indent(split_level)
            } else {
                " ".to_string()
            };
            self.replace_blank(gap, &text);
            self.format_attribute(attribute);
            previous_end = attribute_span.end;
        }

        let content_end = element.start_tag_content_end.min(close);
        let gap = Span::new(content_end, close);
        // Stray text after the last attribute leaves the bracket as written
        if content_end > previous_end || !is_blank(doc.slice(gap)) {
            return false;
        }
        let gap_source = doc.slice(gap);
        let tail = Span::new(content_end, span.end);

        // A rewritten tail does not keep the source's break before the bracket
        if element.self_closed && settings.empty_elements == EmptyElements::Expand {
            let name = doc.slice(name_span);
            let bracket = self.bracket_gap("", level, attributes.len(), false);
            self.edits.replace(tail, &format!("{bracket}></{name}>"));
            return true;
        }
        if settings.empty_elements == EmptyElements::Collapse
            && self.can_collapse(element, span, close, category)
        {
            let bracket = self.bracket_gap("", level, attributes.len(), true);
            self.edits.replace(tail, &format!("{bracket}/>"));
            return true;
        }

        let bracket = self.bracket_gap(gap_source, level, attributes.len(), element.self_closed);
        self.edits.replace(gap, &bracket);
        false
    }

    /// Whitespace wanted before `>` or `/>`
    fn bracket_gap(
        &self,
        source: &str,
        level: usize,
        attribute_count: usize,
        self_closing: bool,
    ) -> String {
        let settings = self.settings;
        if settings.closing_bracket_new_line && settings.split_attributes && attribute_count > 1 {
            self.newline_indent(level + settings.split_attributes_indent_size)
        } else if settings.preserve_attribute_line_breaks && count_newlines(source) > 0 {
            self.newline_indent(level)
        } else if self_closing && settings.space_before_empty_close_tag {
            " ".to_string()
        } else {
            String::new()
        }
    }

    fn can_collapse(
        &self,
        element: &Element,
        span: Span,
        close: usize,
        category: ContentCategory,
    ) -> bool {
        if element.self_closed || !element.closed || !element.has_complete_end_tag() {
            return false;
        }
        let Some(end_tag_open) = element.end_tag_open else {
            return false;
        };
        let body = self.doc.slice(Span::new(close + 1, end_tag_open));
        if !is_blank(body) {
            return false;
        }
        if !body.is_empty()
            && (self.settings.preserve_empty_content || category == ContentCategory::PreserveSpace)
        {
            return false;
        }
        // A partially selected element is left alone.
        self.edits.range().map_or(true, |range| range.encloses(span))
    }

    fn format_end_tag(&mut self, element: &Element) {
        if let (Some(name), Some(close)) = (element.end_tag_name, element.end_tag_close) {
            self.replace_blank(Span::new(name.end, close), "");
        }
    }

    /// `name = "value"` becomes `name="value"`, with the preferred quotes
    /// when they are enforced
    pub(crate) fn format_attribute(&mut self, id: NodeId) {
        let doc = self.doc;
        let NodeKind::Attribute(attribute) = doc.kind(id) else {
            return;
        };
        if let Some(assign) = attribute.assign {
            self.replace_blank(Span::new(attribute.name_span.end, assign), "");
            if let Some(value) = attribute.value {
                self.replace_blank(Span::new(assign + 1, value.span.start), "");
            }
        }

        let Some(value) = attribute.value else {
            return;
        };
        self.protected.push(value.span);
        let (Some(preferred), Some(quote)) = (self.settings.enforced_quote(), value.quote) else {
            return;
        };
        if !value.closed || quote == preferred || value.text(doc.text()).contains(preferred) {
            return;
        }
        let preferred = preferred.to_string();
        let open = Span::new(value.span.start, value.span.start + 1);
        let close = Span::new(value.span.end - 1, value.span.end);
        self.edits.replace(open, &preferred);
        self.edits.replace(close, &preferred);
    }
}
