//! Error types for offset and position conversion

use thiserror::Error;

/// Errors raised when converting between offsets and positions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Offset beyond the end of the document text
    #[error("offset {offset} is outside the document (length {len})")]
    OffsetOutOfRange { offset: usize, len: usize },

    /// Line beyond the last line of the document
    #[error("position {line}:{character} is outside the document ({line_count} lines)")]
    PositionOutOfRange {
        line: u32,
        character: u32,
        line_count: usize,
    },
}

/// Result type for DOM conversions
pub type Result<T> = std::result::Result<T, DomError>;
