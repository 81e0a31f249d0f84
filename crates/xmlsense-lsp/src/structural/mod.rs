//! Structural intelligence for xmlsense LSP
//!
//! This module provides document structure analysis for:
//! - Folding ranges (elements, comments, regions, DOCTYPE subsets)
//! - Document symbols (outline view)
//!
//! Both read the cached parse tree and never re-scan the text.

pub mod folding;
pub mod symbols;

pub use folding::FoldingAnalyzer;
pub use symbols::SymbolAnalyzer;

#[cfg(test)]
mod tests;
