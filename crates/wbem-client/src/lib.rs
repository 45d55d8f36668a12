//! Minimal CIM-XML WBEM client
//!
//! Implements a handful of intrinsic operations (DSP0200/DSP0201) on top of
//! a [`TransportSlot`](wbem_transport::TransportSlot), so every request can be
//! observed and answered by a test transport. The CIM types implement
//! [`Constructible`](wbem_core::Constructible) and are registered with
//! [`register_types`].

pub mod cimxml;
mod connection;
mod error;
mod types;

pub use connection::{InstanceOptions, WbemConnection, DEFAULT_NAMESPACE, FIRST_MESSAGE_ID};
pub use error::{status_name, WbemError, WbemResult};
pub use types::{register_types, CimClassName, CimInstance, CimInstanceName, CimProperty};
