//! Error types for test case loading

use std::path::PathBuf;
use thiserror::Error;

/// Result type for test case loading
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading test case files
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read a file
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse YAML
    #[error("failed to parse YAML in {path}: {source}")]
    ParseYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The document is not a sequence of test case records
    #[error("{path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// A test case record is malformed
    #[error("{path}: test case '{name}': {reason}")]
    InvalidCase {
        path: PathBuf,
        name: String,
        reason: String,
    },

    /// Two test cases share a name
    #[error("duplicate test case name '{name}' in {second} (first defined in {first})")]
    DuplicateName {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Invalid include path
    #[error("invalid include path '{path}': {reason}")]
    InvalidIncludePath { path: String, reason: String },

    /// Circular include detected
    #[error("circular include detected: {path}")]
    CircularInclude { path: PathBuf },

    /// Path is neither a YAML file nor a directory
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    /// Case filter matched nothing
    #[error("no test case named '{name}'")]
    CaseNotFound { name: String },
}
