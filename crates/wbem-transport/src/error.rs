//! Transport errors

use thiserror::Error;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors a transport can raise instead of returning a response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// No transport has been wired into the slot
    #[error("no transport configured")]
    Unconfigured,

    /// A mock transport was installed without a response fixture
    #[error("mock transport has no response fixture for {method} {url}")]
    NoFixture { method: String, url: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} refused")]
    ConnectionRefused { url: String },
}
