//! Test case data model and record parsing

use crate::error_kind::ErrorKind;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::{Mapping, Value as Yaml};
use std::path::{Path, PathBuf};
use wbem_core::ValueSpec;
use wbem_transport::{Headers, HttpResponse, MockReply, TransportFault};

/// Key naming the client operation inside `pywbem_request.operation`
pub const OPERATION_TAG: &str = "pywbem_method";

/// HTTP status returned when a fixture does not give one
pub const DEFAULT_HTTP_STATUS: u16 = 200;

/// One end-to-end test case
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Unique name, used in diagnostics
    pub name: String,
    pub description: String,
    /// File the case was loaded from
    pub source: PathBuf,
    pub request: RequestSpec,
    /// `None` skips all outcome checks
    pub expected_response: Option<ResponseSpec>,
    /// `None` skips all HTTP request checks
    pub expected_http_request: Option<HttpExpectation>,
    /// `None` makes the mock transport fail every request
    pub http_response: Option<HttpFixture>,
}

/// The client operation to call and how to connect
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub operation: String,
    pub arguments: IndexMap<String, ValueSpec>,
    pub connection: ConnectionParams,
}

/// Parameters for constructing the client under test
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectionParams {
    pub url: String,
    pub credentials: Option<(String, String)>,
    pub namespace: Option<String>,
    /// Passed through to the client; the harness does not enforce it
    pub timeout: Option<u64>,
    pub debug: bool,
}

/// Expected outcome of the operation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseSpec {
    /// Expected return value; `None` means the value is not checked
    pub expected_value: Option<ValueSpec>,
    pub expected_error: Option<ErrorKind>,
    /// CIM status code; 0 means success
    pub expected_status: i64,
}

impl ResponseSpec {
    /// Whether the case expects the operation to succeed
    pub fn expects_success(&self) -> bool {
        self.expected_error.is_none() && self.expected_status == 0
    }
}

/// Expected shape of the request the client sends
///
/// Only the parts that are given are checked.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpExpectation {
    pub verb: Option<String>,
    pub url: Option<String>,
    /// Headers that must be present with these values; others are ignored
    pub headers: Headers,
    pub body: Option<String>,
}

/// Canned response returned by the mock transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpFixture {
    pub status: u16,
    pub headers: Headers,
    /// Returned verbatim, whitespace included
    pub body: String,
    /// Raise this transport fault instead of answering
    pub fault: Option<TransportFault>,
}

impl HttpFixture {
    /// What the mock transport should answer with
    pub fn reply(&self) -> MockReply {
        match self.fault {
            Some(fault) => MockReply::Fault(fault),
            None => MockReply::Response(HttpResponse {
                status: self.status,
                headers: self.headers.clone(),
                body: self.body.clone(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTestCase {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(alias = "request")]
    pywbem_request: RawRequest,
    #[serde(alias = "response", default)]
    pywbem_response: Option<Mapping>,
    #[serde(default)]
    http_request: Option<RawHttpRequest>,
    #[serde(default)]
    http_response: Option<RawHttpResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRequest {
    url: String,
    #[serde(default)]
    creds: Option<Vec<String>>,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    timeout: Option<u64>,
    #[serde(default)]
    debug: bool,
    operation: Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHttpRequest {
    #[serde(default)]
    verb: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    headers: Option<IndexMap<String, Yaml>>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHttpResponse {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    headers: Option<IndexMap<String, Yaml>>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    exception: Option<String>,
}

impl TestCase {
    /// Parse one test case record
    ///
    /// Errors are returned as a human readable reason; the loader attaches
    /// file and case name.
    pub fn from_yaml(record: Yaml, source: &Path) -> Result<Self, String> {
        let raw: RawTestCase = serde_yaml::from_value(record).map_err(|e| e.to_string())?;

        let request = parse_request(raw.pywbem_request)?;
        let expected_response = raw.pywbem_response.map(parse_response).transpose()?;
        let expected_http_request = raw.http_request.map(parse_http_request).transpose()?;
        let http_response = raw.http_response.map(parse_http_response).transpose()?;

        Ok(Self {
            name: raw.name,
            description: raw.description,
            source: source.to_path_buf(),
            request,
            expected_response,
            expected_http_request,
            http_response,
        })
    }
}

fn parse_request(raw: RawRequest) -> Result<RequestSpec, String> {
    let credentials = match raw.creds {
        None => None,
        Some(creds) => match <[String; 2]>::try_from(creds) {
            Ok([user, password]) => Some((user, password)),
            Err(creds) => {
                return Err(format!(
                    "creds must be [user, password], got {} item(s)",
                    creds.len()
                ))
            }
        },
    };

    let mut operation = None;
    let mut arguments = IndexMap::new();
    for (key, value) in &raw.operation {
        let key = key
            .as_str()
            .ok_or_else(|| "operation argument names must be strings".to_string())?;
        if key == OPERATION_TAG {
            let name = value
                .as_str()
                .ok_or_else(|| format!("{} must be a string", OPERATION_TAG))?;
            operation = Some(name.to_string());
        } else {
            let spec = ValueSpec::from_yaml(value)
                .map_err(|e| format!("operation argument '{}': {}", key, e))?;
            arguments.insert(key.to_string(), spec);
        }
    }

    Ok(RequestSpec {
        operation: operation.ok_or_else(|| format!("operation has no {}", OPERATION_TAG))?,
        arguments,
        connection: ConnectionParams {
            url: raw.url,
            credentials,
            namespace: raw.namespace,
            timeout: raw.timeout,
            debug: raw.debug,
        },
    })
}

fn parse_response(mapping: Mapping) -> Result<ResponseSpec, String> {
    let mut response = ResponseSpec::default();

    for (key, value) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| "response keys must be strings".to_string())?;
        match key {
            "cim_status" => {
                response.expected_status = match value {
                    Yaml::Null => 0,
                    other => other
                        .as_i64()
                        .ok_or_else(|| "cim_status must be an integer".to_string())?,
                };
            }
            "exception" => {
                response.expected_error = match value {
                    Yaml::Null => None,
                    Yaml::String(name) => Some(name.parse::<ErrorKind>()?),
                    _ => return Err("exception must name an error kind".to_string()),
                };
            }
            "result" => {
                let spec = ValueSpec::from_yaml(&value).map_err(|e| format!("result: {}", e))?;
                response.expected_value = Some(spec);
            }
            other => return Err(format!("unknown response key '{}'", other)),
        }
    }

    Ok(response)
}

fn parse_http_request(raw: RawHttpRequest) -> Result<HttpExpectation, String> {
    Ok(HttpExpectation {
        verb: raw.verb,
        url: raw.url,
        headers: parse_headers(raw.headers)?,
        body: raw.data,
    })
}

fn parse_http_response(raw: RawHttpResponse) -> Result<HttpFixture, String> {
    let fault = raw
        .exception
        .map(|name| name.parse::<TransportFault>())
        .transpose()?;

    Ok(HttpFixture {
        status: raw.status.unwrap_or(DEFAULT_HTTP_STATUS),
        headers: parse_headers(raw.headers)?,
        body: raw.data.unwrap_or_default(),
        fault,
    })
}

fn parse_headers(raw: Option<IndexMap<String, Yaml>>) -> Result<Headers, String> {
    let mut headers = Headers::new();
    for (name, value) in raw.unwrap_or_default() {
        let value = match value {
            Yaml::String(s) => s,
            Yaml::Number(n) => n.to_string(),
            Yaml::Bool(b) => b.to_string(),
            _ => return Err(format!("header '{}' must have a scalar value", name)),
        };
        headers.insert(name, value);
    }
    Ok(headers)
}
