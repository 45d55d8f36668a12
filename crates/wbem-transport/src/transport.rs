//! Transport trait and the swappable slot clients send through

use crate::error::{TransportError, TransportResult};
use crate::http::{HttpRequest, HttpResponse};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

/// Something that can answer an HTTP request
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> TransportResult<HttpResponse>;
}

/// Placeholder wiring that refuses every request
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredTransport;

impl Transport for UnconfiguredTransport {
    fn send(&self, _request: HttpRequest) -> TransportResult<HttpResponse> {
        Err(TransportError::Unconfigured)
    }
}

/// The transport wiring of one client instance
///
/// Cloning the slot yields another handle to the same wiring, so a test can
/// swap the transport underneath a client it does not otherwise control.
#[derive(Clone)]
pub struct TransportSlot {
    current: Arc<RwLock<Arc<dyn Transport>>>,
}

impl TransportSlot {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            current: Arc::new(RwLock::new(transport)),
        }
    }

    /// A slot wired to [`UnconfiguredTransport`]
    pub fn unconfigured() -> Self {
        Self::new(Arc::new(UnconfiguredTransport))
    }

    /// Send a request through whatever transport is currently wired in
    pub fn send(&self, request: HttpRequest) -> TransportResult<HttpResponse> {
        let transport = self.current();
        trace!(method = %request.method, url = %request.url, "Sending request");
        transport.send(request)
    }

    /// The currently wired transport
    pub fn current(&self) -> Arc<dyn Transport> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wire in a new transport, returning the previous one
    pub fn replace(&self, transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, transport)
    }
}

impl Default for TransportSlot {
    fn default() -> Self {
        Self::unconfigured()
    }
}

impl fmt::Debug for TransportSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSlot").finish_non_exhaustive()
    }
}
