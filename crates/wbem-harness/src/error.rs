//! Harness-fatal conditions
//!
//! These abort the current case and report it as errored, which is distinct
//! from a failed case with mismatches.

use thiserror::Error;
use wbem_core::{ArgumentError, BuildError};
use wbem_xml::XmlParseError;

/// A condition that prevents a case from being judged
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HarnessError {
    /// Building request arguments or the expected result failed
    #[error("failed to build {role}: {source}")]
    Build {
        role: &'static str,
        #[source]
        source: BuildError,
    },

    /// Either request body is not well-formed XML
    #[error("malformed XML in {side}: {source}")]
    XmlParse {
        side: &'static str,
        #[source]
        source: XmlParseError,
    },

    #[error("client has no operation '{operation}'")]
    UnknownOperation { operation: String },

    #[error("client panicked in '{operation}': {message}")]
    ClientPanicked { operation: String, message: String },
}

impl HarnessError {
    /// Name of the condition, used in reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            HarnessError::Build {
                source: BuildError::UnknownType { .. },
                ..
            } => "UnknownTypeError",
            HarnessError::Build {
                source: BuildError::Argument { .. },
                ..
            } => "ArgumentError",
            HarnessError::XmlParse { .. } => "XmlParseError",
            HarnessError::UnknownOperation { .. } => "UnknownOperationError",
            HarnessError::ClientPanicked { .. } => "ClientPanic",
        }
    }

    /// The factory error behind an `ArgumentError`, if that is what this is
    pub fn argument_error(&self) -> Option<&ArgumentError> {
        match self {
            HarnessError::Build {
                source: BuildError::Argument { source, .. },
                ..
            } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let unknown = HarnessError::Build {
            role: "request arguments",
            source: BuildError::UnknownType {
                type_name: "CIMFoo".into(),
                path: "$".into(),
            },
        };
        assert_eq!(unknown.kind_name(), "UnknownTypeError");
        assert!(unknown.argument_error().is_none());

        let argument = HarnessError::Build {
            role: "expected result",
            source: BuildError::Argument {
                type_name: "CIMInstance".into(),
                path: "$".into(),
                source: ArgumentError::Missing {
                    name: "classname".into(),
                },
            },
        };
        assert_eq!(argument.kind_name(), "ArgumentError");
        assert!(argument.argument_error().is_some());
        assert_eq!(
            argument.to_string(),
            "failed to build expected result: invalid arguments for 'CIMInstance' at $: missing required argument 'classname'"
        );
    }
}
