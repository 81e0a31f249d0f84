//! Error types for the formatting engine

use thiserror::Error;
use xmlsense_dom::DomError;

/// Errors raised by [`crate::format`]
///
/// Parsing never fails and formatting only fails when it is cancelled or
/// when a requested range lies outside the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The cancellation token was signalled while the tree was being walked
    #[error("formatting was cancelled")]
    Cancelled,

    /// The requested range does not fit the document
    #[error(transparent)]
    OutOfRange(#[from] DomError),
}

/// Result type for formatting operations
pub type Result<T> = std::result::Result<T, FormatError>;
