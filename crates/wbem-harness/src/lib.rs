//! End-to-end test harness for WBEM clients
//!
//! Drives a client under test with declarative test cases and checks both
//! what it sends on the wire and what it returns.
//!
//! # Architecture
//!
//! ```text
//!  YAML files ──► TestCaseLoader ──► TestCase (per file, in order)
//!                                       │
//!                                       ▼
//!                               OperationInvoker ◄── ObjectBuilder ◄── TypeRegistry
//!                                 │         │
//!                  MockTransport ◄┘         ▼
//!                  (records request)     Outcome
//!                                 │         │
//!                                 ▼         ▼
//!                                ResultVerifier ──► CaseResult ──► RunReport
//!                                 (wbem-xml)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod harness;
pub mod invoker;
pub mod report;
pub mod verify;

pub use client::{ClientError, ClientFactory, ClientUnderTest};
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use harness::{CaseRunner, TestHarness};
pub use invoker::{Invocation, OperationInvoker, Outcome};
pub use report::{CaseResult, CaseStatus, RunReport};
pub use verify::{Mismatch, MismatchCategory, ResultVerifier, VerificationResult};

pub use wbem_testcase::ErrorKind;
