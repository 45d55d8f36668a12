//! End-to-end test suite for the WBEM client
//!
//! Connects the reference client to the harness. The binary in `main.rs`
//! runs the YAML cases under `tests/testclient/`.

pub mod adapter;

pub use adapter::{client_error, WbemClientAdapter, WbemClientFactory, OPERATIONS};
