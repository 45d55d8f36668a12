//! Programmable mock transport
//!
//! The mock never touches the network. Each request is recorded verbatim and
//! answered with the canned reply, whatever the request contains.

use crate::error::{TransportError, TransportResult};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, TransportSlot};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// A transport-level failure the mock raises instead of answering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFault {
    Timeout,
    ConnectionRefused,
}

impl FromStr for TransportFault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeout" => Ok(TransportFault::Timeout),
            "connection_refused" => Ok(TransportFault::ConnectionRefused),
            other => Err(format!(
                "unknown transport fault '{}' (expected 'timeout' or 'connection_refused')",
                other
            )),
        }
    }
}

/// What the mock answers with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Response(HttpResponse),
    Fault(TransportFault),
    /// No fixture was supplied; every request fails
    Missing,
}

/// Transport that records requests and returns a canned reply
#[derive(Debug)]
pub struct MockTransport {
    reply: MockReply,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Wire a new mock into `slot`, keeping the previous transport for release
    pub fn install(slot: &TransportSlot, reply: MockReply) -> MockTransportGuard {
        let mock = Arc::new(MockTransport::new(reply));
        let previous = slot.replace(mock.clone());
        debug!("Mock transport installed");

        MockTransportGuard {
            slot: slot.clone(),
            mock,
            previous: Some(previous),
        }
    }

    /// All requests seen so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent request, if any was made
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Mock transport captured request");
        let method = request.method.clone();
        let url = request.url.clone();

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match &self.reply {
            MockReply::Response(response) => Ok(response.clone()),
            MockReply::Fault(TransportFault::Timeout) => Err(TransportError::Timeout { url }),
            MockReply::Fault(TransportFault::ConnectionRefused) => {
                Err(TransportError::ConnectionRefused { url })
            }
            MockReply::Missing => Err(TransportError::NoFixture { method, url }),
        }
    }
}

/// Scoped installation of a [`MockTransport`]
///
/// Dropping the guard, or calling [`release`](Self::release), restores the
/// transport that was wired in before. Releasing twice is a no-op.
#[must_use = "dropping the guard immediately removes the mock transport"]
pub struct MockTransportGuard {
    slot: TransportSlot,
    mock: Arc<MockTransport>,
    previous: Option<Arc<dyn Transport>>,
}

impl MockTransportGuard {
    /// The recorded request, if the client issued one
    pub fn request(&self) -> Option<HttpRequest> {
        self.mock.last_request()
    }

    pub fn mock(&self) -> &MockTransport {
        &self.mock
    }

    pub fn is_installed(&self) -> bool {
        self.previous.is_some()
    }

    /// Restore the previous transport
    pub fn release(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.slot.replace(previous);
            debug!("Mock transport released");
        }
    }
}

impl Drop for MockTransportGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for MockTransportGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransportGuard")
            .field("installed", &self.is_installed())
            .field("mock", &self.mock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::UnconfiguredTransport;

    fn ok_response() -> MockReply {
        let mut response = HttpResponse::new(200);
        response.headers.insert("Content-Type", "application/xml");
        response.body = "  <CIM/>\n".to_string();
        MockReply::Response(response)
    }

    #[test]
    fn test_records_request_and_returns_fixture_verbatim() {
        let slot = TransportSlot::unconfigured();
        let guard = MockTransport::install(&slot, ok_response());

        let request = HttpRequest::post("http://acme.com:80/cimom").body("<anything/>");
        let response = slot.send(request.clone()).unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "  <CIM/>\n");
        assert_eq!(guard.request(), Some(request));
    }

    #[test]
    fn test_no_request_observed() {
        let slot = TransportSlot::unconfigured();
        let guard = MockTransport::install(&slot, ok_response());
        assert_eq!(guard.request(), None);
    }

    #[test]
    fn test_release_restores_previous_transport() {
        let slot = TransportSlot::new(Arc::new(UnconfiguredTransport));
        let mut guard = MockTransport::install(&slot, ok_response());
        assert!(slot.send(HttpRequest::post("u")).is_ok());

        guard.release();
        assert!(!guard.is_installed());
        assert_eq!(
            slot.send(HttpRequest::post("u")),
            Err(TransportError::Unconfigured)
        );

        // Second release is a no-op
        guard.release();
        assert_eq!(
            slot.send(HttpRequest::post("u")),
            Err(TransportError::Unconfigured)
        );
    }

    #[test]
    fn test_drop_restores_previous_transport() {
        let slot = TransportSlot::unconfigured();
        {
            let _guard = MockTransport::install(&slot, ok_response());
            assert!(slot.send(HttpRequest::post("u")).is_ok());
        }
        assert_eq!(
            slot.send(HttpRequest::post("u")),
            Err(TransportError::Unconfigured)
        );
    }

    #[test]
    fn test_restored_even_when_caller_panics() {
        let slot = TransportSlot::unconfigured();
        let inner = slot.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = MockTransport::install(&inner, ok_response());
            panic!("operation blew up");
        }));

        assert!(result.is_err());
        assert_eq!(
            slot.send(HttpRequest::post("u")),
            Err(TransportError::Unconfigured)
        );
    }

    #[test]
    fn test_faults_and_missing_fixture() {
        let slot = TransportSlot::unconfigured();

        let guard = MockTransport::install(&slot, MockReply::Fault(TransportFault::Timeout));
        assert!(matches!(
            slot.send(HttpRequest::post("u")),
            Err(TransportError::Timeout { .. })
        ));
        assert!(guard.request().is_some());
        drop(guard);

        let _guard = MockTransport::install(&slot, MockReply::Missing);
        assert!(matches!(
            slot.send(HttpRequest::post("u")),
            Err(TransportError::NoFixture { .. })
        ));
    }

    #[test]
    fn test_fault_names() {
        assert_eq!(
            "timeout".parse::<TransportFault>(),
            Ok(TransportFault::Timeout)
        );
        assert_eq!(
            "connection_refused".parse::<TransportFault>(),
            Ok(TransportFault::ConnectionRefused)
        );
        assert!("reset".parse::<TransportFault>().is_err());
    }
}
