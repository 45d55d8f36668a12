//! Client errors

use thiserror::Error;

/// Result type for WBEM operations
pub type WbemResult<T> = Result<T, WbemError>;

/// Everything a WBEM operation can fail with
#[derive(Debug, Clone, Error, PartialEq)]
pub enum WbemError {
    /// The server answered with a CIM status code
    #[error("CIM error {status} ({}): {description}", status_label(.status))]
    Cim { status: i64, description: String },

    #[error("HTTP error {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response was not a valid CIM-XML message for this operation
    #[error("invalid CIM-XML response: {0}")]
    Parse(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("timed out: {0}")]
    Timeout(String),

    /// An argument has the right type but an unusable value
    #[error("{0}")]
    Value(String),

    /// An argument has the wrong type or is missing
    #[error("{0}")]
    Type(String),
}

impl WbemError {
    pub fn parse(message: impl Into<String>) -> Self {
        WbemError::Parse(message.into())
    }

    /// CIM status code, for errors that carry one
    pub fn status_code(&self) -> Option<i64> {
        match self {
            WbemError::Cim { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Symbolic name of a DSP0200 status code
pub fn status_name(status: i64) -> &'static str {
    match status {
        1 => "CIM_ERR_FAILED",
        2 => "CIM_ERR_ACCESS_DENIED",
        3 => "CIM_ERR_INVALID_NAMESPACE",
        4 => "CIM_ERR_INVALID_PARAMETER",
        5 => "CIM_ERR_INVALID_CLASS",
        6 => "CIM_ERR_NOT_FOUND",
        7 => "CIM_ERR_NOT_SUPPORTED",
        8 => "CIM_ERR_CLASS_HAS_CHILDREN",
        9 => "CIM_ERR_CLASS_HAS_INSTANCES",
        10 => "CIM_ERR_INVALID_SUPERCLASS",
        11 => "CIM_ERR_ALREADY_EXISTS",
        12 => "CIM_ERR_NO_SUCH_PROPERTY",
        13 => "CIM_ERR_TYPE_MISMATCH",
        14 => "CIM_ERR_QUERY_LANGUAGE_NOT_SUPPORTED",
        15 => "CIM_ERR_INVALID_QUERY",
        16 => "CIM_ERR_METHOD_NOT_AVAILABLE",
        17 => "CIM_ERR_METHOD_NOT_FOUND",
        _ => "CIM_ERR_UNKNOWN",
    }
}

fn status_label(status: &i64) -> &'static str {
    status_name(*status)
}
