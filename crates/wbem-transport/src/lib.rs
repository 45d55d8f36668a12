//! Transport seam between a WBEM client and the network
//!
//! A client sends every request through its [`TransportSlot`]. Tests swap
//! the slot's contents for a [`MockTransport`], which records the request
//! and answers with a canned reply. The returned [`MockTransportGuard`]
//! puts the previous transport back when released or dropped.

mod error;
mod http;
mod mock;
mod transport;

pub use error::{TransportError, TransportResult};
pub use http::{Headers, HttpRequest, HttpResponse};
pub use mock::{MockReply, MockTransport, MockTransportGuard, TransportFault};
pub use transport::{Transport, TransportSlot, UnconfiguredTransport};
