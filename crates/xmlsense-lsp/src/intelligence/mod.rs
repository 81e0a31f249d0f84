//! Intelligence module for xmlsense LSP
//!
//! This module provides smart editing features:
//! - Selection ranges (structure-aware selection expansion)

pub mod selection;

#[cfg(test)]
mod tests;

pub use selection::SelectionAnalyzer;
