//! Content-model queries used by grammar-aware formatting

use std::collections::HashMap;

use xmlsense_dom::{Document, NodeKind, Span};

/// Grammar information about element content
///
/// Implementations must be cheap, synchronous and free of side effects;
/// they are queried from inside the formatting walk.
pub trait ContentModelProvider: Send + Sync {
    /// Whether the element's declared content mixes text and elements
    fn is_mixed_content(&self, element_name: &str) -> bool;

    /// Whether the element's content is typed character data whose
    /// whitespace is significant
    fn is_string_typed(&self, element_name: &str) -> bool;
}

/// Provider with no grammar: every query answers `false`
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContentModel;

impl ContentModelProvider for NoContentModel {
    fn is_mixed_content(&self, _element_name: &str) -> bool {
        false
    }

    fn is_string_typed(&self, _element_name: &str) -> bool {
        false
    }
}

/// Provider built from the `<!ELEMENT>` declarations of a document
///
/// A content model mentioning `#PCDATA`, or declared `ANY`, is mixed.
/// Declarations carry no datatypes, so nothing is string typed.
#[derive(Debug, Clone, Default)]
pub struct InternalSubsetContentModel {
    mixed: HashMap<String, bool>,
}

impl InternalSubsetContentModel {
    pub fn from_document(doc: &Document) -> Self {
        let mut mixed = HashMap::new();
        for (_, node) in doc.nodes() {
            let NodeKind::ElementDecl(decl) = &node.kind else {
                continue;
            };
            let Some(name) = &decl.name else {
                continue;
            };
            let model = match (decl.parameters.get(1), decl.parameters.last()) {
                (Some(first), Some(last)) => doc.slice(Span::new(first.start, last.end)),
                _ => "",
            };
            let is_mixed = model.contains("#PCDATA") || model.trim() == "ANY";
            mixed.insert(name.clone(), is_mixed);
        }
        Self { mixed }
    }

    /// Number of declared elements
    pub fn len(&self) -> usize {
        self.mixed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixed.is_empty()
    }
}

impl ContentModelProvider for InternalSubsetContentModel {
    fn is_mixed_content(&self, element_name: &str) -> bool {
        self.mixed.get(element_name).copied().unwrap_or(false)
    }

    fn is_string_typed(&self, _element_name: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use xmlsense_dom::Dialect;

    #[test]
    fn test_internal_subset_declarations() {
        let doc = parse(
            "<!DOCTYPE r [<!ELEMENT r (p)*><!ELEMENT p (#PCDATA|b)*><!ELEMENT x ANY>]><r/>",
            Dialect::Xml,
        );
        let model = InternalSubsetContentModel::from_document(&doc);

        assert_eq!(model.len(), 3);
        assert!(!model.is_mixed_content("r"));
        assert!(model.is_mixed_content("p"));
        assert!(model.is_mixed_content("x"));
        assert!(!model.is_mixed_content("undeclared"));
        assert!(!model.is_string_typed("p"));
    }

    #[test]
    fn test_no_content_model() {
        assert!(!NoContentModel.is_mixed_content("p"));
        assert!(!NoContentModel.is_string_typed("p"));
    }
}
