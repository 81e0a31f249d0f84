//! xmlsense-dom - Tolerant XML document model
//!
//! This crate provides the arena-backed node tree produced by the
//! xmlsense tree builder, together with offset/position conversion.
//!
//! - [`Document`]: source text, line index and node arena
//! - [`NodeKind`]: tagged union over element, attribute, text, comment,
//!   CDATA, processing instruction, DOCTYPE and DTD declaration nodes
//! - [`LineIndex`]: O(log n) offset to line/character mapping

pub mod document;
pub mod error;
pub mod node;
pub mod position;

pub use document::{Dialect, Document};
pub use error::{DomError, Result};
pub use node::{
    Attribute, AttributeValue, CharacterData, Declaration, DocumentType, DocumentTypeKind,
    Element, Node, NodeId, NodeKind, ProcessingInstruction,
};
pub use position::{LineIndex, Position, Range, Span};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
