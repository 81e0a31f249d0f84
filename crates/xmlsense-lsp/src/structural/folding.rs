//! Folding range generation for XML documents
//!
//! Generates LSP folding ranges for:
//! - Elements spanning several lines (the end tag line stays visible)
//! - Comments, and `<!-- #region -->` / `<!-- #endregion -->` pairs
//! - CDATA sections, processing instructions and DTD declarations
//! - DOCTYPE internal subsets

use tower_lsp::lsp_types::{FoldingRange, FoldingRangeKind};
use xmlsense_dom::{Document, NodeId, NodeKind};

const REGION_START: &str = "#region";
const REGION_END: &str = "#endregion";

/// Analyzer for generating folding ranges
pub struct FoldingAnalyzer;

impl FoldingAnalyzer {
    /// Generate folding ranges for the entire document, ordered by start line
    pub fn generate_ranges(doc: &Document) -> Vec<FoldingRange> {
        let mut ranges = Vec::new();
        let mut regions: Vec<usize> = Vec::new();
        let line_of = |offset: usize| doc.line_index().line_of(offset);

        for id in doc.descendants(NodeId::ROOT) {
            let span = doc.span(id);
            let start_line = line_of(span.start);
            // the last line of a node ends at its final character
            let last_line = line_of(span.end.saturating_sub(1).max(span.start));

            match doc.kind(id) {
                NodeKind::Element(element) if !element.orphan_end_tag => {
                    if let Some(end_tag) = element.end_tag_open {
                        let end_line = line_of(end_tag).saturating_sub(1);
                        push(&mut ranges, start_line, end_line, None);
                    }
                }
                NodeKind::Comment(data) => {
                    let comment = doc.slice(data.content).trim();
                    if comment.starts_with(REGION_END) {
                        if let Some(region_start) = regions.pop() {
                            let kind = Some(FoldingRangeKind::Region);
                            push(&mut ranges, region_start, start_line, kind);
                        }
                    } else if comment.starts_with(REGION_START) {
                        regions.push(start_line);
                    } else {
                        let kind = Some(FoldingRangeKind::Comment);
                        push(&mut ranges, start_line, last_line, kind);
                    }
                }
                NodeKind::DocumentType(doctype) => {
                    if let (Some(open), Some(close)) = (doctype.subset_open, doctype.subset_close) {
                        let end_line = line_of(close).saturating_sub(1);
                        push(&mut ranges, line_of(open), end_line, None);
                    }
                }
                NodeKind::CData(_)
                | NodeKind::ProcessingInstruction(_)
                | NodeKind::ElementDecl(_)
                | NodeKind::AttlistDecl(_)
                | NodeKind::EntityDecl(_)
                | NodeKind::NotationDecl(_) => {
                    push(&mut ranges, start_line, last_line, None);
                }
                _ => {}
            }
        }

        // Unterminated regions produce no fold
        ranges.sort_by_key(|range| (range.start_line, std::cmp::Reverse(range.end_line)));
        ranges
    }
}

fn push(
    ranges: &mut Vec<FoldingRange>,
    start_line: usize,
    end_line: usize,
    kind: Option<FoldingRangeKind>,
) {
    if end_line <= start_line {
        return;
    }
    ranges.push(FoldingRange {
        start_line: start_line as u32,
        end_line: end_line as u32,
        kind,
        start_character: None,
        end_character: None,
        collapsed_text: None,
    });
}
