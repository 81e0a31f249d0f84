//! Tests for the intelligence module

use xmlsense_core::parse;
use xmlsense_dom::{Dialect, Document};

/// Parse `marked` with the `|` cursor marker removed; returns the cursor offset
fn with_cursor(marked: &str) -> (Document, usize) {
    let offset = marked.find('|').expect("cursor marker");
    let text = marked.replacen('|', "", 1);
    (parse(&text, Dialect::Xml), offset)
}

// ============================================================================
// SELECTION RANGE TESTS
// ============================================================================

mod selection_tests {
    use super::*;
    use crate::intelligence::selection::{SelectionAnalyzer, SelectionKind};

    fn texts(doc: &Document, offset: usize) -> Vec<String> {
        SelectionAnalyzer::new(doc)
            .get_selection_hierarchy(offset)
            .iter()
            .map(|level| doc.slice(level.span).to_string())
            .collect()
    }

    /// TEST 1: Attribute Value Expansion
    /// value → quoted value → attribute → start tag → element → document
    #[test]
    fn test_attribute_value_expansion() {
        let (doc, offset) = with_cursor("<root>\n  <item key=\"va|lue\">x</item>\n</root>");

        assert_eq!(
            texts(&doc, offset),
            vec![
                "value",
                "\"value\"",
                "key=\"value\"",
                "<item key=\"value\">",
                "<item key=\"value\">x</item>",
                "<root>\n  <item key=\"value\">x</item>\n</root>",
            ]
        );
    }

    /// TEST 2: Tag Name Expansion
    #[test]
    fn test_start_tag_name() {
        let (doc, offset) = with_cursor("<a><it|em k=\"v\"/></a>");

        let levels = texts(&doc, offset);

        assert_eq!(levels[0], "item");
        assert_eq!(levels[1], "<item k=\"v\"/>");
        assert_eq!(levels[2], "<a><item k=\"v\"/></a>");
        assert_eq!(levels.len(), 3, "element equals its start tag, document equals root");
    }

    /// TEST 3: End Tag Expansion
    #[test]
    fn test_end_tag_name() {
        let (doc, offset) = with_cursor("<doc>\n<b>text</|b>\n</doc>");

        let levels = texts(&doc, offset);

        assert_eq!(levels[0], "b");
        assert_eq!(levels[1], "</b>");
        assert_eq!(levels[2], "<b>text</b>");
    }

    /// TEST 4: Text Content
    /// Text selects without its surrounding whitespace first
    #[test]
    fn test_text_selection() {
        let (doc, offset) = with_cursor("<p>\n  hello wo|rld\n</p>");

        let levels = texts(&doc, offset);

        assert_eq!(levels[0], "hello world");
        assert_eq!(levels[1], "<p>\n  hello world\n</p>");
    }

    /// TEST 5: Levels strictly grow
    #[test]
    fn test_levels_nest() {
        let (doc, offset) = with_cursor("<a>\n  <b>\n    <c d='|e'/>\n  </b>\n</a>\n");
        let levels = SelectionAnalyzer::new(&doc).get_selection_hierarchy(offset);

        for pair in levels.windows(2) {
            assert!(pair[1].span.encloses(pair[0].span));
            assert_ne!(pair[0].span, pair[1].span);
        }
        assert_eq!(levels[0].kind, SelectionKind::AttributeValue);
        assert_eq!(levels.last().unwrap().kind, SelectionKind::Document);
    }

    /// TEST 6: LSP Selection Range Chain
    #[test]
    fn test_selection_range_chain() {
        let (doc, offset) = with_cursor("<a>\n  <b|/>\n</a>");

        let range = SelectionAnalyzer::new(&doc).selection_range(offset).unwrap();

        assert_eq!(range.range.start.line, 1);
        assert_eq!(range.range.start.character, 3);
        let mut depth = 1;
        let mut current = &range;
        while let Some(parent) = &current.parent {
            depth += 1;
            current = parent;
        }
        assert_eq!(current.range.start.line, 0);
        assert_eq!(current.range.end.line, 2);
        assert_eq!(depth, 3, "name, tag, root spanning the document");
    }

    /// TEST 7: Broken Markup
    #[test]
    fn test_broken_markup_selection() {
        let (doc, offset) = with_cursor("<a>\n  <b x=\"1|\n</a>");
        let levels = SelectionAnalyzer::new(&doc).get_selection_hierarchy(offset);
        assert!(!levels.is_empty());
        assert_eq!(levels.last().unwrap().span.end, doc.len());
    }

    /// TEST 8: Cursor past the end
    #[test]
    fn test_offset_past_end() {
        let doc = parse("<a/>", Dialect::Xml);
        let levels = SelectionAnalyzer::new(&doc).get_selection_hierarchy(99);
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].kind, SelectionKind::Document);
    }
}
