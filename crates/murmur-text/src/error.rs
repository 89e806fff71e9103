//! Error types for murmur-text.

use thiserror::Error;

/// Errors raised while preparing an entry.
#[derive(Debug, Error)]
pub enum TextError {
    /// A name could not be turned into a word-boundary pattern.
    #[error("invalid name pattern: {0}")]
    NamePattern(#[from] regex::Error),
}

/// Result type alias for text operations.
pub type TextResult<T> = Result<T, TextError>;
