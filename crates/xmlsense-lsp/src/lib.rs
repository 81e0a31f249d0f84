//! xmlsense Language Server Protocol implementation
//!
//! This library provides LSP support for XML and DTD files, including:
//! - Whole-document and range formatting with minimal edits
//! - Folding ranges for elements, comments, regions and DOCTYPE subsets
//! - Document symbols for navigation
//! - Selection ranges for structure-aware selection
//! - Incremental text synchronisation
//!
//! # Library Usage
//!
//! ```ignore
//! use xmlsense_lsp::run_server;
//!
//! // Run the LSP server
//! run_server().await;
//! ```
//!
//! The analyzers work on any parsed document:
//!
//! ```
//! use xmlsense_core::parse;
//! use xmlsense_dom::Dialect;
//! use xmlsense_lsp::structural::SymbolAnalyzer;
//!
//! let doc = parse("<root><item/></root>", Dialect::Xml);
//! let symbols = SymbolAnalyzer::extract_symbols(&doc);
//! assert_eq!(symbols[0].name, "root");
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Start the language server (typically called by an editor)
//! xmlsense-lsp
//!
//! # With debug logging
//! RUST_LOG=debug xmlsense-lsp
//! ```

pub mod config;
pub mod document;
pub mod intelligence;
pub mod server;
pub mod structural;

// Re-export main entry point
pub use server::run_server;

// Re-export commonly used types
pub use config::Settings;
pub use document::TextDocument;
pub use server::format_tree;
