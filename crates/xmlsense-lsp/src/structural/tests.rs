//! Tests for structural intelligence

use super::folding::FoldingAnalyzer;
use super::symbols::SymbolAnalyzer;
use tower_lsp::lsp_types::{DocumentSymbol, FoldingRange, FoldingRangeKind, SymbolKind};
use xmlsense_core::parse;
use xmlsense_dom::Dialect;

fn folds(text: &str) -> Vec<FoldingRange> {
    FoldingAnalyzer::generate_ranges(&parse(text, Dialect::Xml))
}

fn lines(ranges: &[FoldingRange]) -> Vec<(u32, u32)> {
    ranges.iter().map(|r| (r.start_line, r.end_line)).collect()
}

fn symbols(text: &str, dialect: Dialect) -> Vec<DocumentSymbol> {
    SymbolAnalyzer::extract_symbols(&parse(text, dialect))
}

fn children(symbol: &DocumentSymbol) -> &[DocumentSymbol] {
    symbol.children.as_deref().unwrap_or(&[])
}

// ============================================================================
// FOLDING RANGE TESTS
// ============================================================================

/// TEST 1: Element Folding
/// A multi-line element folds up to the line before its end tag
#[test]
fn test_element_folding() {
    let text = "\
<root>
  <item>
    <name>x</name>
  </item>
</root>";

    let ranges = folds(text);

    assert_eq!(lines(&ranges), vec![(0, 3), (1, 2)]);
    assert!(ranges.iter().all(|r| r.kind.is_none()));
}

/// TEST 2: Single Line Element No Fold
#[test]
fn test_single_line_no_fold() {
    assert!(folds("<a><b/></a>").is_empty());
    assert!(folds("<a>\n</a>").is_empty(), "nothing to hide between the tags");
}

/// TEST 3: Comment Folding
#[test]
fn test_comment_folding() {
    let text = "\
<a>
  <!--
    long note
  -->
</a>";

    let comments: Vec<FoldingRange> = folds(text)
        .into_iter()
        .filter(|r| r.kind == Some(FoldingRangeKind::Comment))
        .collect();

    assert_eq!(lines(&comments), vec![(1, 3)]);
}

/// TEST 4: Region Markers
/// `#region` / `#endregion` comments fold together as a Region
#[test]
fn test_region_folding() {
    let text = "\
<a>
  <!-- #region setup -->
  <b/>
  <c/>
  <!-- #endregion -->
</a>";

    let ranges = folds(text);
    let regions: Vec<&FoldingRange> = ranges
        .iter()
        .filter(|r| r.kind == Some(FoldingRangeKind::Region))
        .collect();

    assert_eq!(regions.len(), 1);
    assert_eq!((regions[0].start_line, regions[0].end_line), (1, 4));
    assert!(!ranges.iter().any(|r| r.kind == Some(FoldingRangeKind::Comment)));
}

/// TEST 5: Unterminated Region
#[test]
fn test_unterminated_region() {
    let text = "<a>\n<!-- #region -->\n<b/>\n</a>";
    let ranges = folds(text);
    assert!(!ranges.iter().any(|r| r.kind == Some(FoldingRangeKind::Region)));
}

/// TEST 6: CDATA and DOCTYPE subset
#[test]
fn test_cdata_and_subset_folding() {
    let text = "\
<!DOCTYPE a [
  <!ELEMENT a (#PCDATA)>
  <!ENTITY e \"v\">
]>
<a><![CDATA[
x
]]></a>";

    let ranges = folds(text);

    assert!(lines(&ranges).contains(&(0, 2)), "subset: {:?}", lines(&ranges));
    assert!(lines(&ranges).contains(&(4, 6)), "cdata: {:?}", lines(&ranges));
}

/// TEST 7: Unclosed Elements Do Not Fold
#[test]
fn test_unclosed_element_no_fold() {
    let text = "<a>\n  <b>\n    text\n";
    assert!(folds(text).is_empty());
}

/// TEST 8: Folds are ordered by start line
#[test]
fn test_folds_sorted() {
    let text = "<a>\n<!--\n-->\n<b>\n<c/>\n</b>\n</a>";
    let starts: Vec<u32> = folds(text).iter().map(|r| r.start_line).collect();
    let mut sorted = starts.clone();
    sorted.sort();
    assert_eq!(starts, sorted);
}

// ============================================================================
// DOCUMENT SYMBOL TESTS
// ============================================================================

/// TEST 9: Element Outline
/// Elements nest like the tree
#[test]
fn test_element_outline() {
    let text = "<root>\n  <item id=\"first\"/>\n  <item><name/></item>\n</root>";

    let outline = symbols(text, Dialect::Xml);

    assert_eq!(outline.len(), 1);
    assert_eq!(outline[0].name, "root");
    assert_eq!(outline[0].kind, SymbolKind::FIELD);

    let items = children(&outline[0]);
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].detail.as_deref(), Some("#first"));
    assert_eq!(children(&items[1])[0].name, "name");
}

/// TEST 10: Selection range is the element name
#[test]
fn test_symbol_selection_range() {
    let outline = symbols("<a>\n  <bee/>\n</a>", Dialect::Xml);
    let bee = &children(&outline[0])[0];

    assert_eq!(bee.range.start.line, 1);
    assert_eq!(bee.selection_range.start.character, 3);
    assert_eq!(bee.selection_range.end.character, 6);
}

/// TEST 11: Prolog, PIs and DOCTYPE
#[test]
fn test_prolog_and_doctype_symbols() {
    let text = "\
<?xml version=\"1.0\"?>
<?xml-stylesheet href=\"s.xsl\"?>
<!DOCTYPE note SYSTEM \"note.dtd\" [
  <!ELEMENT note (to)>
  <!ATTLIST note id ID #IMPLIED>
  <!ENTITY writer \"me\">
  <!NOTATION gif SYSTEM \"image/gif\">
]>
<note/>";

    let outline = symbols(text, Dialect::Xml);
    let summary: Vec<(&str, SymbolKind)> =
        outline.iter().map(|s| (s.name.as_str(), s.kind)).collect();

    assert_eq!(
        summary,
        vec![
            ("xml", SymbolKind::PROPERTY),
            ("xml-stylesheet", SymbolKind::PROPERTY),
            ("DOCTYPE:note", SymbolKind::STRUCT),
            ("note", SymbolKind::FIELD),
        ]
    );

    let declarations: Vec<(&str, SymbolKind)> = children(&outline[2])
        .iter()
        .map(|s| (s.name.as_str(), s.kind))
        .collect();
    assert_eq!(
        declarations,
        vec![
            ("note", SymbolKind::PROPERTY),
            ("note", SymbolKind::KEY),
            ("writer", SymbolKind::CONSTANT),
            ("gif", SymbolKind::INTERFACE),
        ]
    );
}

/// TEST 12: Standalone DTD
#[test]
fn test_dtd_file_symbols() {
    let text = "<!ELEMENT a (b)*>\n<!ENTITY % common \"x\">\n%common;";

    let outline = symbols(text, Dialect::Dtd);

    assert_eq!(outline.len(), 2);
    assert_eq!(outline[0].name, "a");
    assert_eq!(outline[1].name, "common");
    assert_eq!(outline[1].selection_range.start.character, 11);
}

/// TEST 13: Broken markup still yields an outline
#[test]
fn test_symbols_tolerate_broken_markup() {
    let outline = symbols("<a>\n  <b\n  <c></c>\n</x>", Dialect::Xml);
    assert_eq!(outline[0].name, "a");
    assert!(!children(&outline[0]).is_empty());
}

/// TEST 14: Empty document
#[test]
fn test_empty_document() {
    assert!(symbols("", Dialect::Xml).is_empty());
    assert!(folds("").is_empty());
}
