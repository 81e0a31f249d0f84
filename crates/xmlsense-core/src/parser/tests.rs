//! Tree builder tests

use super::parse;
use xmlsense_dom::{Dialect, Document, DocumentTypeKind, NodeId, NodeKind, Span};

fn xml(text: &str) -> Document {
    parse(text, Dialect::Xml)
}

/// Check the structural invariants every tree must satisfy
fn assert_well_nested(doc: &Document) {
    for (id, node) in doc.nodes() {
        assert!(node.span.start <= node.span.end, "{:?} inverted", id);
        assert!(node.span.end <= doc.len(), "{:?} past end", id);
        let mut previous_end = node.span.start;
        for &child in &node.children {
            let span = doc.span(child);
            assert!(span.start >= previous_end, "{:?} overlaps sibling", child);
            assert!(span.end <= node.span.end, "{:?} escapes parent", child);
            assert_eq!(doc.parent(child), Some(id));
            previous_end = span.end;
        }
    }
}

// ============================================================================
// ELEMENTS
// ============================================================================

/// TEST 1: Nested elements with text
#[test]
fn test_nested_elements() {
    let doc = xml("<a><b>text</b><c/></a>");
    assert_well_nested(&doc);
    let a = doc.document_element().unwrap();
    assert_eq!(doc.element_name(a), Some("a"));
    assert_eq!(doc.span(a), Span::new(0, 22));
    let children = doc.children(a);
    assert_eq!(children.len(), 2);
    let b = children[0];
    assert_eq!(doc.span(b), Span::new(3, 14));
    assert!(matches!(doc.kind(doc.children(b)[0]), NodeKind::Text));
    let c = doc.element(children[1]).unwrap();
    assert!(c.self_closed && c.closed);
    assert_eq!(c.start_tag_close, Some(16));
}

/// TEST 2: Start and end tag delimiter offsets
#[test]
fn test_tag_offsets() {
    let doc = xml("<a x='1' ></a  >");
    let a = doc.element(doc.document_element().unwrap()).unwrap();
    assert_eq!(a.name_span, Some(Span::new(1, 2)));
    assert_eq!(a.start_tag_content_end, 8);
    assert_eq!(a.start_tag_close, Some(9));
    assert_eq!(a.end_tag_open, Some(10));
    assert_eq!(a.end_tag_name, Some(Span::new(12, 13)));
    assert_eq!(a.end_tag_close, Some(15));
    assert!(a.closed);
}

/// TEST 3: Whitespace-only content creates no text node
#[test]
fn test_whitespace_only_content() {
    let doc = xml("<a>\n  <b/>\n</a>");
    let a = doc.document_element().unwrap();
    assert_eq!(doc.children(a).len(), 1);
}

/// TEST 4: Unmatched inner element is closed implicitly by its parent
#[test]
fn test_implicit_close() {
    let doc = xml("<a><b><c></a>");
    assert_well_nested(&doc);
    let a = doc.document_element().unwrap();
    let b = doc.children(a)[0];
    let c = doc.children(b)[0];
    for id in [b, c] {
        assert!(!doc.element(id).unwrap().closed);
        assert_eq!(doc.span(id).end, 9);
    }
    assert!(doc.element(a).unwrap().closed);
    assert_eq!(doc.span(a).end, 13);
}

/// TEST 5: End tag with no open match becomes an orphan marker
#[test]
fn test_orphan_end_tag() {
    let doc = xml("<a></b></a>");
    assert_well_nested(&doc);
    let a = doc.document_element().unwrap();
    let orphan_id = doc.children(a)[0];
    let orphan = doc.element(orphan_id).unwrap();
    assert!(orphan.orphan_end_tag);
    assert_eq!(orphan.name.as_deref(), Some("b"));
    assert_eq!(orphan.end_tag_close, Some(6));
    assert!(doc.children(orphan_id).is_empty());
    assert!(doc.element(a).unwrap().closed);
}

/// TEST 6: Elements still open at end of input span to the end
#[test]
fn test_unclosed_at_eof() {
    let doc = xml("<a><b>x");
    assert_well_nested(&doc);
    let a = doc.document_element().unwrap();
    assert_eq!(doc.span(a).end, 7);
    assert_eq!(doc.span(doc.children(a)[0]).end, 7);
}

/// TEST 7: Unclosed start tag keeps following markup as children
#[test]
fn test_unclosed_start_tag() {
    let doc = xml("<a\n<b></b>");
    assert_well_nested(&doc);
    let a = doc.document_element().unwrap();
    assert!(!doc.element(a).unwrap().start_tag_closed());
    assert_eq!(doc.element(a).unwrap().start_tag_content_end, 2);
    assert_eq!(doc.children(a).len(), 1);
}

/// TEST 8: Degenerate inputs still produce a document root
#[test]
fn test_degenerate_inputs() {
    for text in ["", "<", "</", "text only", "<a", "<a></", "</a>", "<!--", "<?", "<!DOCTYPE"] {
        let doc = xml(text);
        assert_well_nested(&doc);
        assert!(matches!(doc.kind(NodeId::ROOT), NodeKind::Document));
        assert_eq!(doc.span(NodeId::ROOT), Span::new(0, text.len()));
    }
}

// ============================================================================
// ATTRIBUTES
// ============================================================================

/// TEST 9: Quoted, unquoted, valueless and duplicate attributes
#[test]
fn test_attribute_forms() {
    let doc = xml(r#"<a x="1" y=2 z x='3'/>"#);
    let a = doc.document_element().unwrap();
    let attrs = doc.attributes(a);
    assert_eq!(attrs.len(), 4);
    assert_eq!(doc.attribute_value(a, "x"), Some("3"));
    assert_eq!(doc.attribute_value(a, "y"), Some("2"));
    let y = doc.attribute(a, "y").unwrap();
    assert!(!y.value.unwrap().has_delimiters());
    let z = doc.attribute(a, "z").unwrap();
    assert!(z.value.is_none() && z.assign.is_none());
    assert_eq!(doc.span(attrs[0]), Span::new(3, 8));
}

/// TEST 10: Value with only an opening delimiter is kept verbatim
#[test]
fn test_unterminated_attribute_value() {
    let doc = xml("<a x=\"1></a>");
    let a = doc.document_element().unwrap();
    let value = doc.attribute(a, "x").unwrap().value.unwrap();
    assert_eq!(doc.slice(value.span), "\"1");
    assert!(!value.closed);
    assert!(doc.element(a).unwrap().closed);
}

/// TEST 11: Attribute lookup at an offset
#[test]
fn test_find_attribute_at() {
    let doc = xml(r#"<a href="x"/>"#);
    let attr = doc.find_attribute_at(5).unwrap();
    assert_eq!(doc.as_attribute(attr).unwrap().name, "href");
}

// ============================================================================
// COMMENTS, CDATA, PROLOG
// ============================================================================

/// TEST 12: Comment and CDATA content spans
#[test]
fn test_comment_and_cdata() {
    let doc = xml("<a><!-- c --><![CDATA[x]]></a>");
    let a = doc.document_element().unwrap();
    let children = doc.children(a);
    match doc.kind(children[0]) {
        NodeKind::Comment(data) => {
            assert!(data.closed);
            assert_eq!(doc.slice(data.content), " c ");
        }
        other => panic!("expected comment, got {:?}", other),
    }
    match doc.kind(children[1]) {
        NodeKind::CData(data) => assert_eq!(doc.slice(data.content), "x"),
        other => panic!("expected cdata, got {:?}", other),
    }
}

/// TEST 13: Unclosed comment runs to the end of input
#[test]
fn test_unclosed_comment() {
    let doc = xml("<a><!-- c <b/>");
    let a = doc.document_element().unwrap();
    let comment = doc.children(a)[0];
    assert!(matches!(doc.kind(comment), NodeKind::Comment(d) if !d.closed));
    assert_eq!(doc.span(comment).end, doc.len());
}

/// TEST 14: Prolog pseudo-attributes and processing instructions
#[test]
fn test_prolog_and_pi() {
    let doc = xml("<?xml version=\"1.0\" encoding='UTF-8'?>\n<?pi data here ?><a/>");
    assert_well_nested(&doc);
    let children = doc.children(NodeId::ROOT);
    let prolog = children[0];
    match doc.kind(prolog) {
        NodeKind::ProcessingInstruction(pi) => {
            assert!(pi.prolog && pi.closed);
            assert_eq!(pi.attributes.len(), 2);
        }
        other => panic!("expected prolog, got {:?}", other),
    }
    assert_eq!(doc.attribute_value(prolog, "encoding"), Some("UTF-8"));
    match doc.kind(children[1]) {
        NodeKind::ProcessingInstruction(pi) => {
            assert_eq!(pi.target.as_deref(), Some("pi"));
            assert_eq!(doc.slice(pi.content.unwrap()), "data here");
        }
        other => panic!("expected pi, got {:?}", other),
    }
}

// ============================================================================
// DOCTYPE & DTD
// ============================================================================

/// TEST 15: DOCTYPE external identifiers
#[test]
fn test_doctype_identifiers() {
    let doc = xml(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0//EN" "x.dtd"><html/>"#);
    let doctype = doc.doctype().unwrap();
    match doc.kind(doctype) {
        NodeKind::DocumentType(dt) => {
            assert_eq!(dt.name.as_deref(), Some("html"));
            assert_eq!(dt.external_kind, Some(DocumentTypeKind::Public));
            assert_eq!(dt.public_id.as_deref(), Some("-//W3C//DTD XHTML 1.0//EN"));
            assert_eq!(dt.system_id.as_deref(), Some("x.dtd"));
            assert!(dt.closed);
        }
        other => panic!("expected doctype, got {:?}", other),
    }
}

/// TEST 16: Internal subset children keep source order
#[test]
fn test_internal_subset() {
    let doc = xml("<!DOCTYPE n [\n<!ELEMENT n (#PCDATA)>\n<!-- c -->\n%pe;\n<!BOGUS>\n<!ENTITY % e \"x\">\n]>\n<n/>");
    assert_well_nested(&doc);
    let doctype = doc.doctype().unwrap();
    let kinds: Vec<&str> = doc
        .children(doctype)
        .iter()
        .map(|&id| doc.kind(id).name())
        .collect();
    assert_eq!(
        kinds,
        vec!["elementDecl", "comment", "dtdText", "unknownDecl", "entityDecl"]
    );
    let entity = doc.children(doctype)[4];
    let decl = doc.kind(entity).declaration().unwrap();
    assert_eq!(decl.name.as_deref(), Some("e"));
    assert!(decl.closed);
    assert!(doc.document_element().is_some());
}

/// TEST 17: Unterminated subset content is kept, not dropped
#[test]
fn test_unterminated_declaration() {
    let doc = xml("<!DOCTYPE n [<!ELEMENT n <!ELEMENT m EMPTY>]>");
    let doctype = doc.doctype().unwrap();
    let decls = doc.children(doctype);
    assert_eq!(decls.len(), 2);
    let first = doc.kind(decls[0]).declaration().unwrap();
    assert!(!first.closed);
    assert_eq!(doc.span(decls[0]), Span::new(13, 24));
    assert!(doc.kind(decls[1]).declaration().unwrap().closed);
}

/// TEST 18: DTD files hold declarations directly under the root
#[test]
fn test_dtd_dialect() {
    let doc = parse(
        "<!ELEMENT a (b)*>\n<!ATTLIST a id ID #REQUIRED>\n<!NOTATION gif SYSTEM \"gif\">",
        Dialect::Dtd,
    );
    assert_well_nested(&doc);
    let kinds: Vec<&str> = doc
        .children(NodeId::ROOT)
        .iter()
        .map(|&id| doc.kind(id).name())
        .collect();
    assert_eq!(kinds, vec!["elementDecl", "attlistDecl", "notationDecl"]);
    assert_eq!(doc.dialect(), Dialect::Dtd);
}

/// TEST 19: Every fragment of a larger document parses with sound spans
#[test]
fn test_prefixes_are_well_nested() {
    let text = "<?xml version=\"1.0\"?>\n<!DOCTYPE r [<!ENTITY e \"v\">]>\n<r a='1'>\n  <!-- c -->\n  <s>t<![CDATA[d]]></s>\n  <?p x?>\n</r>\n";
    for end in 0..=text.len() {
        assert_well_nested(&xml(&text[..end]));
    }
}
