//! Document symbol generation for XML documents
//!
//! Generates the LSP DocumentSymbol hierarchy for the outline view:
//! - Elements → FIELD, nested like the tree
//! - Prolog and processing instructions → PROPERTY
//! - DOCTYPE → STRUCT, with its declarations as children
//! - `<!ELEMENT` → PROPERTY, `<!ATTLIST` → KEY, `<!ENTITY` → CONSTANT,
//!   `<!NOTATION` → INTERFACE

use tower_lsp::lsp_types::{DocumentSymbol, SymbolKind};
use xmlsense_dom::{Declaration, Document, NodeId, NodeKind, Span};

use crate::document::to_lsp_range;

/// Main analyzer for extracting document symbols
pub struct SymbolAnalyzer;

impl SymbolAnalyzer {
    /// Extract symbols for every top-level node of the document
    pub fn extract_symbols(doc: &Document) -> Vec<DocumentSymbol> {
        Self::symbols_of(doc, NodeId::ROOT)
    }

    fn symbols_of(doc: &Document, parent: NodeId) -> Vec<DocumentSymbol> {
        doc.children(parent)
            .iter()
            .filter_map(|&child| Self::symbol(doc, child))
            .collect()
    }

    fn symbol(doc: &Document, id: NodeId) -> Option<DocumentSymbol> {
        let span = doc.span(id);
        let (name, kind, name_span) = match doc.kind(id) {
            NodeKind::Element(element) if !element.orphan_end_tag => (
                element.name.clone().unwrap_or_else(|| "?".to_string()),
                SymbolKind::FIELD,
                element.name_span,
            ),
            NodeKind::ProcessingInstruction(pi) => (
                pi.target.clone().unwrap_or_else(|| "?".to_string()),
                SymbolKind::PROPERTY,
                pi.target_span,
            ),
            NodeKind::DocumentType(doctype) => (
                format!("DOCTYPE:{}", doctype.name.as_deref().unwrap_or("?")),
                SymbolKind::STRUCT,
                doctype.parameters.first().copied(),
            ),
            NodeKind::ElementDecl(decl) => Self::declaration(doc, decl, SymbolKind::PROPERTY),
            NodeKind::AttlistDecl(decl) => Self::declaration(doc, decl, SymbolKind::KEY),
            NodeKind::EntityDecl(decl) => Self::declaration(doc, decl, SymbolKind::CONSTANT),
            NodeKind::NotationDecl(decl) => Self::declaration(doc, decl, SymbolKind::INTERFACE),
            _ => return None,
        };

        let range = to_lsp_range(doc.range_of(span).ok()?);
        let selection_range = name_span
            .filter(|name| span.encloses(*name))
            .and_then(|name| doc.range_of(name).ok())
            .map(to_lsp_range)
            .unwrap_or(range);
        let children = Self::symbols_of(doc, id);

        #[allow(deprecated)]
        let symbol = DocumentSymbol {
            name,
            detail: Self::detail(doc, id),
            kind,
            tags: None,
            deprecated: None,
            range,
            selection_range,
            children: if children.is_empty() {
                None
            } else {
                Some(children)
            },
        };
        Some(symbol)
    }

    fn declaration(
        doc: &Document,
        decl: &Declaration,
        kind: SymbolKind,
    ) -> (String, SymbolKind, Option<Span>) {
        let Some(name) = decl.name.clone() else {
            return ("?".to_string(), kind, None);
        };
        let name_span = decl
            .parameters
            .iter()
            .copied()
            .find(|&parameter| doc.slice(parameter) == name);
        (name, kind, name_span)
    }

    /// `id` attribute of an element, or the external identifier of a DOCTYPE
    fn detail(doc: &Document, id: NodeId) -> Option<String> {
        match doc.kind(id) {
            NodeKind::Element(_) => doc.attribute_value(id, "id").map(|value| format!("#{value}")),
            NodeKind::DocumentType(doctype) => {
                doctype.public_id.clone().or_else(|| doctype.system_id.clone())
            }
            _ => None,
        }
    }
}
