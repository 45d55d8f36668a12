//! Error types for value construction

use thiserror::Error;

/// Result type for object graph construction
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors raised while materializing a [`ValueSpec`](crate::ValueSpec)
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    /// A constructed spec names a type with no registered factory
    #[error("unknown type '{type_name}' at {path}")]
    UnknownType { type_name: String, path: String },

    /// A factory rejected the fully built arguments
    #[error("invalid arguments for '{type_name}' at {path}: {source}")]
    Argument {
        type_name: String,
        path: String,
        #[source]
        source: ArgumentError,
    },
}

impl BuildError {
    /// Location in the spec tree where construction failed
    pub fn path(&self) -> &str {
        match self {
            BuildError::UnknownType { path, .. } | BuildError::Argument { path, .. } => path,
        }
    }
}

/// Errors a factory reports when the built arguments do not fit its type
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArgumentError {
    #[error("missing required argument '{name}'")]
    Missing { name: String },

    #[error("argument '{name}' expects {expected}, got {found}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: String,
    },

    #[error("unexpected argument '{name}'")]
    Unexpected { name: String },

    #[error("invalid value for argument '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

/// Errors converting a YAML fragment into a [`ValueSpec`](crate::ValueSpec)
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpecError {
    #[error("mapping key at {path} must be a string")]
    NonStringKey { path: String },

    #[error("'{tag}' at {path} must name a type as a string")]
    InvalidTypeName { tag: &'static str, path: String },

    #[error("YAML tag '{tag}' at {path} is not supported in value specifications")]
    UnsupportedTag { tag: String, path: String },

    #[error("number at {path} is out of range")]
    NumberOutOfRange { path: String },
}
