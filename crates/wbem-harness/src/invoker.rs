//! Operation invoker
//!
//! Builds the arguments, constructs a fresh client, wires the mock transport
//! into it and calls the named operation. The mock is released on every
//! exit path, including a panicking client.

use crate::client::{ClientError, ClientFactory};
use crate::error::HarnessError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, instrument};
use wbem_core::{ObjectBuilder, Value};
use wbem_testcase::{HttpFixture, RequestSpec};
use wbem_transport::{HttpRequest, MockReply, MockTransport};

/// What the operation did
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(ClientError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

/// Result of one invocation: the outcome plus the request the mock recorded
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub outcome: Outcome,
    /// `None` if the client never issued a request
    pub http_request: Option<HttpRequest>,
}

/// Calls one operation on a freshly constructed client
#[derive(Clone, Copy)]
pub struct OperationInvoker<'a> {
    builder: ObjectBuilder<'a>,
    factory: &'a dyn ClientFactory,
}

impl<'a> OperationInvoker<'a> {
    pub fn new(builder: ObjectBuilder<'a>, factory: &'a dyn ClientFactory) -> Self {
        Self { builder, factory }
    }

    /// Invoke the request's operation against the given response fixture
    #[instrument(skip_all, fields(operation = %request.operation))]
    pub fn invoke(
        &self,
        request: &RequestSpec,
        fixture: Option<&HttpFixture>,
    ) -> Result<Invocation, HarnessError> {
        let arguments = self
            .builder
            .build_arguments(&request.arguments)
            .map_err(|source| HarnessError::Build {
                role: "request arguments",
                source,
            })?;

        let client = match self.factory.connect(&request.connection) {
            Ok(client) => client,
            Err(error) => {
                debug!(%error, "Client construction failed");
                return Ok(Invocation {
                    outcome: Outcome::Failure(error),
                    http_request: None,
                });
            }
        };

        if !client.has_operation(&request.operation) {
            return Err(HarnessError::UnknownOperation {
                operation: request.operation.clone(),
            });
        }

        let reply = fixture.map_or(MockReply::Missing, HttpFixture::reply);
        let mut guard = MockTransport::install(client.transport(), reply);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            client.call(&request.operation, arguments)
        }));

        let http_request = guard.request();
        guard.release();

        let outcome = match result {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(error)) => Outcome::Failure(error),
            Err(payload) => {
                return Err(HarnessError::ClientPanicked {
                    operation: request.operation.clone(),
                    message: panic_message(payload.as_ref()),
                })
            }
        };

        debug!(
            success = outcome.is_success(),
            request_observed = http_request.is_some(),
            "Operation returned"
        );
        Ok(Invocation {
            outcome,
            http_request,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
