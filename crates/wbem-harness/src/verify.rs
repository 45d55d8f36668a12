//! Result verifier
//!
//! Reconciles an [`Invocation`] with what a test case expects. Every check
//! group runs independently, so one case can report several mismatches at
//! once. Only what the case specifies is checked.

use crate::error::HarnessError;
use crate::invoker::{Invocation, Outcome};
use serde::Serialize;
use std::fmt;
use tracing::trace;
use wbem_core::{ObjectBuilder, Value};
use wbem_testcase::{HttpExpectation, ResponseSpec, TestCase};
use wbem_transport::HttpRequest;

/// Which checked dimension differs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchCategory {
    /// Success where an error was expected, or the reverse
    Outcome,
    ErrorKind,
    StatusCode,
    ReturnValue,
    /// The client never issued a request
    NoRequest,
    HttpVerb,
    HttpUrl,
    HttpHeader,
    HttpBody,
}

impl fmt::Display for MismatchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchCategory::Outcome => write!(f, "OUTCOME"),
            MismatchCategory::ErrorKind => write!(f, "EXCEPTION"),
            MismatchCategory::StatusCode => write!(f, "CIMSTATUS"),
            MismatchCategory::ReturnValue => write!(f, "RESULT"),
            MismatchCategory::NoRequest => write!(f, "NOREQUEST"),
            MismatchCategory::HttpVerb => write!(f, "VERB"),
            MismatchCategory::HttpUrl => write!(f, "URL"),
            MismatchCategory::HttpHeader => write!(f, "HEADER"),
            MismatchCategory::HttpBody => write!(f, "BODY"),
        }
    }
}

/// A specific difference between expectation and observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub category: MismatchCategory,
    pub path: String,
    pub expected: String,
    pub actual: String,
}

impl Mismatch {
    fn new(
        category: MismatchCategory,
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            category,
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>9}] {} : expected={} actual={}",
            self.category, self.path, self.expected, self.actual
        )
    }
}

/// Verdict for one case
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub case_name: String,
    pub passed: bool,
    pub failures: Vec<Mismatch>,
}

/// Checks invocations against test case expectations
#[derive(Clone, Copy)]
pub struct ResultVerifier<'r> {
    builder: ObjectBuilder<'r>,
}

impl<'r> ResultVerifier<'r> {
    pub fn new(builder: ObjectBuilder<'r>) -> Self {
        Self { builder }
    }

    /// Verify one invocation
    ///
    /// Fails only for harness-fatal conditions: an expected result that
    /// cannot be built, or a request body that is not well-formed XML.
    pub fn verify(
        &self,
        case: &TestCase,
        invocation: &Invocation,
    ) -> Result<VerificationResult, HarnessError> {
        let mut failures = Vec::new();

        if let Some(expected) = &case.expected_response {
            self.verify_outcome(expected, &invocation.outcome, &mut failures)?;
        }

        if let Some(expected) = &case.expected_http_request {
            verify_http_request(expected, invocation.http_request.as_ref(), &mut failures)?;
        }

        trace!(case = %case.name, mismatches = failures.len(), "Verified case");
        Ok(VerificationResult {
            case_name: case.name.clone(),
            passed: failures.is_empty(),
            failures,
        })
    }

    fn verify_outcome(
        &self,
        expected: &ResponseSpec,
        outcome: &Outcome,
        failures: &mut Vec<Mismatch>,
    ) -> Result<(), HarnessError> {
        // Built up front so a malformed fixture errors even when the call failed
        let expected_value = expected
            .expected_value
            .as_ref()
            .map(|spec| self.builder.build(spec))
            .transpose()
            .map_err(|source| HarnessError::Build {
                role: "expected result",
                source,
            })?;

        if let Some(kind) = expected.expected_error {
            match outcome {
                Outcome::Failure(error) if error.kind == kind => {}
                Outcome::Failure(error) => failures.push(Mismatch::new(
                    MismatchCategory::ErrorKind,
                    "exception",
                    kind.name(),
                    error.to_string(),
                )),
                Outcome::Success(value) => failures.push(Mismatch::new(
                    MismatchCategory::Outcome,
                    "exception",
                    kind.name(),
                    format!("success: {}", value),
                )),
            }
        }

        if expected.expected_status != 0 {
            match outcome {
                Outcome::Failure(error) if error.status_code == Some(expected.expected_status) => {}
                Outcome::Failure(error) => failures.push(Mismatch::new(
                    MismatchCategory::StatusCode,
                    "cim_status",
                    expected.expected_status.to_string(),
                    error
                        .status_code
                        .map_or_else(|| "(none)".to_string(), |code| code.to_string()),
                )),
                // Already reported against the expected error kind
                Outcome::Success(_) if expected.expected_error.is_some() => {}
                Outcome::Success(value) => failures.push(Mismatch::new(
                    MismatchCategory::Outcome,
                    "cim_status",
                    expected.expected_status.to_string(),
                    format!("success: {}", value),
                )),
            }
        }

        if expected.expects_success() {
            if let Outcome::Failure(error) = outcome {
                failures.push(Mismatch::new(
                    MismatchCategory::Outcome,
                    "outcome",
                    "success",
                    error.to_string(),
                ));
            }
        }

        if let (Some(expected_value), Outcome::Success(actual)) = (&expected_value, outcome) {
            diff_values("result", expected_value, actual, failures);
        }

        Ok(())
    }
}

/// Structural comparison of an expected and an actual return value
fn diff_values(path: &str, expected: &Value, actual: &Value, failures: &mut Vec<Mismatch>) {
    match (expected, actual) {
        (Value::List(e), Value::List(a)) => {
            if e.len() != a.len() {
                failures.push(Mismatch::new(
                    MismatchCategory::ReturnValue,
                    format!("{}.length", path),
                    e.len().to_string(),
                    a.len().to_string(),
                ));
            }
            for (i, (e, a)) in e.iter().zip(a.iter()).enumerate() {
                diff_values(&format!("{}[{}]", path, i), e, a, failures);
            }
        }
        (Value::Map(e), Value::Map(a)) => {
            for (key, e_value) in e {
                let key_path = format!("{}.{}", path, key);
                match a.get(key) {
                    Some(a_value) => diff_values(&key_path, e_value, a_value, failures),
                    None => failures.push(Mismatch::new(
                        MismatchCategory::ReturnValue,
                        key_path,
                        e_value.to_string(),
                        "(missing)",
                    )),
                }
            }
            for (key, a_value) in a {
                if !e.contains_key(key) {
                    failures.push(Mismatch::new(
                        MismatchCategory::ReturnValue,
                        format!("{}.{}", path, key),
                        "(not present)",
                        a_value.to_string(),
                    ));
                }
            }
        }
        _ => {
            if expected != actual {
                failures.push(Mismatch::new(
                    MismatchCategory::ReturnValue,
                    path,
                    expected.to_string(),
                    actual.to_string(),
                ));
            }
        }
    }
}

fn verify_http_request(
    expected: &HttpExpectation,
    actual: Option<&HttpRequest>,
    failures: &mut Vec<Mismatch>,
) -> Result<(), HarnessError> {
    let Some(actual) = actual else {
        failures.push(Mismatch::new(
            MismatchCategory::NoRequest,
            "http_request",
            "a request",
            "NoRequestObservedError: the client issued no request",
        ));
        return Ok(());
    };

    if let Some(verb) = &expected.verb {
        if *verb != actual.method {
            failures.push(Mismatch::new(
                MismatchCategory::HttpVerb,
                "verb",
                verb.as_str(),
                actual.method.as_str(),
            ));
        }
    }

    if let Some(url) = &expected.url {
        if *url != actual.url {
            failures.push(Mismatch::new(
                MismatchCategory::HttpUrl,
                "url",
                url.as_str(),
                actual.url.as_str(),
            ));
        }
    }

    for (name, value) in expected.headers.iter() {
        match actual.headers.get(name) {
            Some(actual_value) if actual_value == value => {}
            Some(actual_value) => failures.push(Mismatch::new(
                MismatchCategory::HttpHeader,
                format!("header.{}", name),
                value,
                actual_value,
            )),
            None => failures.push(Mismatch::new(
                MismatchCategory::HttpHeader,
                format!("header.{}", name),
                value,
                "(missing)",
            )),
        }
    }

    if let Some(body) = &expected.body {
        verify_body(body, &actual.body, failures)?;
    }

    Ok(())
}

fn verify_body(expected: &str, actual: &str, failures: &mut Vec<Mismatch>) -> Result<(), HarnessError> {
    match (expected.trim().is_empty(), actual.trim().is_empty()) {
        (true, true) => return Ok(()),
        (true, false) | (false, true) => {
            failures.push(Mismatch::new(
                MismatchCategory::HttpBody,
                "data",
                expected,
                actual,
            ));
            return Ok(());
        }
        (false, false) => {}
    }

    let expected = wbem_xml::parse(expected).map_err(|source| HarnessError::XmlParse {
        side: "expected request body",
        source,
    })?;
    let actual = wbem_xml::parse(actual).map_err(|source| HarnessError::XmlParse {
        side: "actual request body",
        source,
    })?;

    failures.extend(wbem_xml::diff_trees(&expected, &actual).into_iter().map(|d| {
        Mismatch::new(
            MismatchCategory::HttpBody,
            format!("data{} ({})", d.path, d.kind),
            d.expected,
            d.actual,
        )
    }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use std::path::Path;
    use wbem_core::{Arguments, TypeRegistry};
    use wbem_testcase::ErrorKind;
    use wbem_transport::Headers;

    fn registry() -> TypeRegistry {
        TypeRegistry::builder()
            .register("Echo", |mut args: Arguments| {
                let value = args.required::<Value>("value")?;
                args.finish()?;
                Ok(value)
            })
            .build()
    }

    fn case(yaml: &str) -> TestCase {
        let record = serde_yaml::from_str(yaml).unwrap();
        TestCase::from_yaml(record, Path::new("test.yaml")).unwrap()
    }

    fn request(body: &str) -> HttpRequest {
        let mut request = HttpRequest::post("http://acme.com:80/cimom").body(body);
        request.headers = [
            ("content-type", "application/xml; charset=\"utf-8\""),
            ("CIMMethod", "GetInstance"),
            ("CIMOperation", "MethodCall"),
        ]
        .into_iter()
        .collect::<Headers>();
        request
    }

    fn verify(case: &TestCase, outcome: Outcome, http_request: Option<HttpRequest>) -> VerificationResult {
        let registry = registry();
        let verifier = ResultVerifier::new(ObjectBuilder::new(&registry));
        verifier
            .verify(
                case,
                &Invocation {
                    outcome,
                    http_request,
                },
            )
            .unwrap()
    }

    const BASE: &str = r#"
name: base
pywbem_request:
  url: http://acme.com:80
  operation: {pywbem_method: GetInstance}
"#;

    #[test]
    fn test_success_with_expected_value() {
        let case = case(&format!("{}pywbem_response:\n  result: {{pywbem_object: Echo, value: 42}}\n", BASE));

        let result = verify(&case, Outcome::Success(Value::Int(42)), None);
        assert!(result.passed);

        let result = verify(&case, Outcome::Success(Value::Int(41)), None);
        assert!(!result.passed);
        assert_eq!(result.failures[0].category, MismatchCategory::ReturnValue);
        assert_eq!(result.failures[0].path, "result");
    }

    #[test]
    fn test_default_response_expects_success() {
        let case = case(&format!("{}pywbem_response: {{}}\n", BASE));

        let error = ClientError::new(ErrorKind::ConnectionError, "refused");
        let result = verify(&case, Outcome::Failure(error), None);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].category, MismatchCategory::Outcome);
    }

    #[test]
    fn test_expected_error_kind() {
        let case = case(&format!("{}pywbem_response:\n  exception: HTTPError\n", BASE));

        let matching = ClientError::new(ErrorKind::HttpError, "500");
        assert!(verify(&case, Outcome::Failure(matching), None).passed);

        let other = ClientError::new(ErrorKind::ParseError, "bad xml");
        let result = verify(&case, Outcome::Failure(other), None);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].category, MismatchCategory::ErrorKind);

        let result = verify(&case, Outcome::Success(Value::Null), None);
        assert_eq!(result.failures[0].category, MismatchCategory::Outcome);
    }

    #[test]
    fn test_expected_status_and_kind_together() {
        let case = case(&format!(
            "{}pywbem_response:\n  exception: CIMError\n  cim_status: 6\n",
            BASE
        ));

        let found = ClientError::new(ErrorKind::CimError, "not found").with_status(6);
        assert!(verify(&case, Outcome::Failure(found), None).passed);

        let wrong = ClientError::new(ErrorKind::CimError, "failed").with_status(1);
        let result = verify(&case, Outcome::Failure(wrong), None);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].category, MismatchCategory::StatusCode);

        // A success is reported once, not once per expectation
        let result = verify(&case, Outcome::Success(Value::Null), None);
        assert_eq!(result.failures.len(), 1);
    }

    #[test]
    fn test_omitted_sections_are_not_checked() {
        let case = case(BASE);
        let error = ClientError::new(ErrorKind::TimeoutError, "slow");
        assert!(verify(&case, Outcome::Failure(error), None).passed);
    }

    #[test]
    fn test_http_request_checks() {
        let case = case(&format!(
            r#"{}http_request:
  verb: POST
  url: http://acme.com:80/cimom
  headers:
    Content-Type: application/xml; charset="utf-8"
    CIMMethod: GetInstance
  data: |
    <CIM>
      <MESSAGE ID="1001"/>
    </CIM>
"#,
            BASE
        ));

        let result = verify(
            &case,
            Outcome::Success(Value::Null),
            Some(request(r#"<CIM><MESSAGE ID="1001"/></CIM>"#)),
        );
        assert!(result.passed, "{:?}", result.failures);

        let mut wrong = request(r#"<CIM><MESSAGE ID="1002"/></CIM>"#);
        wrong.method = "GET".into();
        wrong.url = "http://acme.com:80/other".into();
        wrong.headers.insert("CIMMethod", "DeleteInstance");
        let result = verify(&case, Outcome::Success(Value::Null), Some(wrong));

        let categories: Vec<_> = result.failures.iter().map(|f| f.category).collect();
        assert_eq!(
            categories,
            [
                MismatchCategory::HttpVerb,
                MismatchCategory::HttpUrl,
                MismatchCategory::HttpHeader,
                MismatchCategory::HttpBody,
            ]
        );
    }

    #[test]
    fn test_missing_header() {
        let case = case(&format!("{}http_request:\n  headers: {{CIMObject: root/cimv2}}\n", BASE));
        let result = verify(&case, Outcome::Success(Value::Null), Some(request("<CIM/>")));
        assert_eq!(result.failures[0].actual, "(missing)");
    }

    #[test]
    fn test_no_request_observed() {
        let case = case(&format!("{}http_request:\n  verb: POST\n", BASE));
        let result = verify(&case, Outcome::Success(Value::Null), None);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].category, MismatchCategory::NoRequest);
    }

    #[test]
    fn test_malformed_expected_body_is_fatal() {
        let case = case(&format!("{}http_request:\n  data: <CIM>\n", BASE));
        let registry = registry();
        let verifier = ResultVerifier::new(ObjectBuilder::new(&registry));

        let err = verifier
            .verify(
                &case,
                &Invocation {
                    outcome: Outcome::Success(Value::Null),
                    http_request: Some(request("<CIM/>")),
                },
            )
            .unwrap_err();
        assert!(matches!(err, HarnessError::XmlParse { side: "expected request body", .. }));
    }

    #[test]
    fn test_unbuildable_expected_result_is_fatal() {
        let case = case(&format!("{}pywbem_response:\n  result: {{pywbem_object: Echo}}\n", BASE));
        let registry = registry();
        let verifier = ResultVerifier::new(ObjectBuilder::new(&registry));

        let err = verifier
            .verify(
                &case,
                &Invocation {
                    outcome: Outcome::Success(Value::Null),
                    http_request: None,
                },
            )
            .unwrap_err();
        assert_eq!(err.kind_name(), "ArgumentError");
    }

    #[test]
    fn test_list_values_report_element_paths() {
        let mut failures = Vec::new();
        diff_values(
            "result",
            &Value::List(vec![Value::from("a"), Value::from("b")]),
            &Value::List(vec![Value::from("a"), Value::from("c"), Value::from("d")]),
            &mut failures,
        );
        let paths: Vec<_> = failures.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["result.length", "result[1]"]);
    }
}
