//! Whitespace handling category of element content

use xmlsense_dom::{Document, Element, NodeId, NodeKind};

use super::provider::ContentModelProvider;
use super::settings::FormattingSettings;

/// How the whitespace between an element's children is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    /// Left exactly as written
    PreserveSpace,
    /// Text interleaved with elements; layout stays inline
    MixedContent,
    /// Element-only content; every child goes on its own line
    IgnoreSpace,
    /// Text-only content; whitespace runs are normalized
    NormalizeSpace,
}

/// Classify the content of element `id` given its parent's category
pub(crate) fn classify(
    doc: &Document,
    id: NodeId,
    element: &Element,
    parent: ContentCategory,
    settings: &FormattingSettings,
    provider: &dyn ContentModelProvider,
) -> ContentCategory {
    // An element without an end tag has no content boundary of its own.
    if !element.closed && !element.self_closed {
        return parent;
    }

    if let Some(name) = element.name.as_deref() {
        if settings.is_preserve_space(name) {
            return ContentCategory::PreserveSpace;
        }
        if settings.grammar_aware_formatting {
            if provider.is_string_typed(name) {
                return ContentCategory::PreserveSpace;
            }
            if provider.is_mixed_content(name) {
                return ContentCategory::MixedContent;
            }
        }
    }

    match doc.attribute_value(id, "xml:space") {
        Some("preserve") => return ContentCategory::PreserveSpace,
        Some("default") => {}
        _ if parent == ContentCategory::PreserveSpace => return ContentCategory::PreserveSpace,
        _ => {}
    }

    let mut has_element = false;
    let mut has_text = false;
    for &child in doc.children(id) {
        match doc.kind(child) {
            NodeKind::Element(_) => has_element = true,
            NodeKind::Text => has_text |= !doc.node_text(child).trim().is_empty(),
            _ => {}
        }
    }

    match (has_element, has_text) {
        (true, true) => ContentCategory::MixedContent,
        (true, false) => ContentCategory::IgnoreSpace,
        _ => ContentCategory::NormalizeSpace,
    }
}
