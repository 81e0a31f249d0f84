//! Scanner states

/// Where the scanner is inside the markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScannerState {
    WithinContent,
    AfterOpeningStartTag,
    WithinTag,
    AfterAttributeName,
    BeforeAttributeValue,
    AfterOpeningEndTag,
    WithinEndTag,
    WithinComment,
    WithinCData,
    PrologOrPi,
    WithinPi,
    WithinDoctype,
    WithinInternalDtd,
    WithinDeclaration,
}
