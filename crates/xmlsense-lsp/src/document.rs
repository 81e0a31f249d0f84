//! Open documents
//!
//! The server keeps the latest text of every open document together with
//! its client version. Incremental `didChange` events are applied over a
//! line index of the current text, and the parse tree is built lazily and
//! cached until the next change.

use std::sync::Arc;

use tower_lsp::lsp_types::{self as lsp, TextDocumentContentChangeEvent};
use xmlsense_core::parse;
use xmlsense_dom::{Dialect, Document, DomError, LineIndex, Position, Range};

/// One open text document
#[derive(Debug, Clone)]
pub struct TextDocument {
    text: String,
    version: i32,
    dialect: Dialect,
    tree: Option<Arc<Document>>,
}

impl TextDocument {
    pub fn new(text: String, version: i32, dialect: Dialect) -> Self {
        Self {
            text,
            version,
            dialect,
            tree: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse tree of the current revision
    pub fn tree(&mut self) -> Arc<Document> {
        if let Some(tree) = &self.tree {
            return Arc::clone(tree);
        }
        let tree = Arc::new(parse(&self.text, self.dialect));
        self.tree = Some(Arc::clone(&tree));
        tree
    }

    /// Parse tree of the current revision if one was already built
    pub fn cached_tree(&self) -> Option<Arc<Document>> {
        self.tree.clone()
    }

    /// Keep `tree` for the current revision; a tree of other text is
    /// dropped and false is returned
    pub fn cache_tree(&mut self, tree: Arc<Document>) -> bool {
        if tree.text() != self.text {
            return false;
        }
        self.tree = Some(tree);
        true
    }

    /// Apply the content changes of one `didChange` notification in order
    ///
    /// Either every change applies and the document moves to `version`, or
    /// the document keeps its previous text and version.
    pub fn apply_changes(
        &mut self,
        version: i32,
        changes: &[TextDocumentContentChangeEvent],
    ) -> Result<(), DomError> {
        let mut text = self.text.clone();
        for change in changes {
            apply_change(&mut text, change)?;
        }
        self.text = text;
        self.version = version;
        self.tree = None;
        Ok(())
    }
}

fn apply_change(
    text: &mut String,
    change: &TextDocumentContentChangeEvent,
) -> Result<(), DomError> {
    let Some(range) = change.range else {
        *text = change.text.clone();
        return Ok(());
    };
    let lines = LineIndex::new(text);
    let start = lines.offset_at(text, from_lsp_position(range.start))?;
    let end = lines.offset_at(text, from_lsp_position(range.end))?;
    text.replace_range(start.min(end)..start.max(end), &change.text);
    Ok(())
}

pub fn from_lsp_position(position: lsp::Position) -> Position {
    Position::new(position.line, position.character)
}

pub fn from_lsp_range(range: lsp::Range) -> Range {
    Range::new(from_lsp_position(range.start), from_lsp_position(range.end))
}

pub fn to_lsp_position(position: Position) -> lsp::Position {
    lsp::Position::new(position.line, position.character)
}

pub fn to_lsp_range(range: Range) -> lsp::Range {
    lsp::Range::new(to_lsp_position(range.start), to_lsp_position(range.end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(range: Option<(u32, u32, u32, u32)>, text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: range.map(|(sl, sc, el, ec)| {
                lsp::Range::new(lsp::Position::new(sl, sc), lsp::Position::new(el, ec))
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_full_replacement() {
        let mut doc = TextDocument::new("<a/>".to_string(), 1, Dialect::Xml);
        doc.apply_changes(2, &[change(None, "<b/>")]).unwrap();
        assert_eq!(doc.text(), "<b/>");
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn test_incremental_changes_apply_in_order() {
        let mut doc = TextDocument::new("<a>\n  <b/>\n</a>".to_string(), 1, Dialect::Xml);
        let changes = [
            // rename b to c
            change(Some((1, 3, 1, 4)), "c"),
            // then insert an attribute after it
            change(Some((1, 4, 1, 4)), " x=\"1\""),
        ];
        doc.apply_changes(2, &changes).unwrap();
        assert_eq!(doc.text(), "<a>\n  <c x=\"1\"/>\n</a>");
    }

    #[test]
    fn test_utf16_positions() {
        let mut doc = TextDocument::new("<a>𝄞x</a>".to_string(), 1, Dialect::Xml);
        // 𝄞 is two UTF-16 units
        doc.apply_changes(2, &[change(Some((0, 5, 0, 6)), "y")]).unwrap();
        assert_eq!(doc.text(), "<a>𝄞y</a>");
    }

    #[test]
    fn test_change_past_end_is_error() {
        let mut doc = TextDocument::new("<a/>".to_string(), 1, Dialect::Xml);
        assert!(doc.apply_changes(2, &[change(Some((5, 0, 5, 0)), "x")]).is_err());
        assert_eq!(doc.text(), "<a/>");
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn test_failed_change_discards_earlier_ones() {
        let mut doc = TextDocument::new("<a/>".to_string(), 1, Dialect::Xml);
        let first = doc.tree();
        let changes = [
            change(Some((0, 1, 0, 2)), "b"),
            change(Some((3, 0, 3, 0)), "x"),
        ];
        assert!(doc.apply_changes(2, &changes).is_err());
        assert_eq!(doc.text(), "<a/>");
        assert_eq!(doc.version(), 1);
        assert!(Arc::ptr_eq(&first, &doc.tree()));
    }

    #[test]
    fn test_tree_built_elsewhere_is_cached() {
        let mut doc = TextDocument::new("<a/>".to_string(), 1, Dialect::Xml);
        assert!(doc.cached_tree().is_none());

        let tree = Arc::new(parse(doc.text(), doc.dialect()));
        doc.apply_changes(2, &[change(None, "<b/>")]).unwrap();
        assert!(!doc.cache_tree(tree));
        assert!(doc.cached_tree().is_none());

        let tree = Arc::new(parse(doc.text(), doc.dialect()));
        assert!(doc.cache_tree(Arc::clone(&tree)));
        assert!(Arc::ptr_eq(&tree, &doc.tree()));
    }

    #[test]
    fn test_tree_cached_per_revision() {
        let mut doc = TextDocument::new("<a/>".to_string(), 1, Dialect::Xml);
        let first = doc.tree();
        assert!(Arc::ptr_eq(&first, &doc.tree()));

        doc.apply_changes(2, &[change(None, "<b/>")]).unwrap();
        let second = doc.tree();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.element_name(second.document_element().unwrap()), Some("b"));
    }
}
