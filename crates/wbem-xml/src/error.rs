//! Error type for malformed XML

use thiserror::Error;

/// Result type for XML parsing
pub type XmlResult<T> = Result<T, XmlParseError>;

/// An input is not a well-formed XML document
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed XML at byte {position}: {message}")]
pub struct XmlParseError {
    /// Byte offset where the parser gave up
    pub position: u64,
    pub message: String,
}

impl XmlParseError {
    pub fn new(position: u64, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}
