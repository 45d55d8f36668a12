//! Seam between the harness and the client under test
//!
//! The harness knows nothing about the client beyond these traits: it can
//! construct one from connection parameters, swap its transport, and call
//! operations by name with dynamically built arguments.

use std::fmt;
use wbem_core::{ArgumentMap, TypeRegistryBuilder, Value};
use wbem_testcase::{ConnectionParams, ErrorKind};
use wbem_transport::TransportSlot;

/// An error raised by the client under test, classified by kind
#[derive(Debug, Clone, PartialEq)]
pub struct ClientError {
    pub kind: ErrorKind,
    /// CIM status code, for errors that carry one
    pub status_code: Option<i64>,
    pub message: String,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status_code: i64) -> Self {
        self.status_code = Some(status_code);
        self
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (status {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ClientError {}

/// A live client instance the harness can drive
pub trait ClientUnderTest {
    /// The transport wiring this client sends every request through
    fn transport(&self) -> &TransportSlot;

    /// Whether the client exposes an operation with this name
    fn has_operation(&self, operation: &str) -> bool;

    /// Call an operation with fully built arguments
    fn call(&self, operation: &str, arguments: ArgumentMap) -> Result<Value, ClientError>;
}

/// Constructs clients and describes the types they expose
pub trait ClientFactory: Send + Sync {
    /// Register every type test cases may construct
    fn register_types(&self, registry: TypeRegistryBuilder) -> TypeRegistryBuilder;

    /// Create a fresh client; must not issue any request
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn ClientUnderTest>, ClientError>;
}
