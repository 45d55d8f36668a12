//! Test case definitions for WBEM client end-to-end tests
//!
//! Test cases live in YAML files, each holding a sequence of records:
//!
//! ```yaml
//! - name: GetInstance1
//!   description: GetInstance succeeds
//!   pywbem_request:
//!     url: http://acme.com:80
//!     creds: [username, password]
//!     namespace: root/cimv2
//!     timeout: 10
//!     debug: false
//!     operation:
//!       pywbem_method: GetInstance
//!       InstanceName:
//!         pywbem_object: CIMInstanceName
//!         classname: PyWBEM_Person
//!         keybindings: {Name: Fritz}
//!   pywbem_response:
//!     result: ...
//!   http_request:
//!     verb: POST
//!     url: http://acme.com:80/cimom
//!     headers: {CIMMethod: GetInstance}
//!     data: <CIM>...</CIM>
//!   http_response:
//!     status: 200
//!     headers: {Content-Type: application/xml}
//!     data: <CIM>...</CIM>
//! ```
//!
//! Files may pull in shared fragments with `!include path`.

mod error;
mod error_kind;
mod loader;
mod testcase;

pub use error::{LoadError, LoadResult};
pub use error_kind::ErrorKind;
pub use loader::{load_paths, TestCaseLoader};
pub use testcase::{
    ConnectionParams, HttpExpectation, HttpFixture, RequestSpec, ResponseSpec, TestCase,
    DEFAULT_HTTP_STATUS, OPERATION_TAG,
};
