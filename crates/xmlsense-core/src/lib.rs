//! xmlsense-core - tolerant XML scanning, parsing and formatting
//!
//! The scanner turns any text into tokens without ever failing, the parser
//! builds an [`xmlsense_dom::Document`] from them, recovering locally from
//! malformed markup, and the formatter computes the minimal edits that
//! bring a document into canonical layout.
//!
//! # Example
//!
//! ```
//! use xmlsense_core::{apply_edits, format, parse, FormattingSettings};
//! use xmlsense_dom::Dialect;
//!
//! let doc = parse("<a k1=\"v1\" k2=\"v2\"></a>", Dialect::Xml);
//! let settings = FormattingSettings {
//!     split_attributes: true,
//!     ..Default::default()
//! };
//!
//! let edits = format(&doc, &settings, None).unwrap();
//! assert_eq!(
//!     apply_edits(doc.text(), &edits),
//!     "<a\n    k1=\"v1\"\n    k2=\"v2\"></a>"
//! );
//! ```

pub mod error;
pub mod format;
pub mod parser;
pub mod scanner;

// Re-export main types and functions
pub use error::{FormatError, Result};
pub use format::{
    apply_edits, format, CancellationToken, ContentCategory, ContentModelProvider, EmptyElements,
    EnforceQuoteStyle, Formatter, FormattingSettings, InternalSubsetContentModel, NoContentModel,
    QuoteStyle, TextEdit,
};
pub use parser::parse;
pub use scanner::{Scanner, ScannerState, Token, TokenType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
