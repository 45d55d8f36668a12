//! Closed set of error conditions a client operation can raise

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Kind of error raised by the client under test
///
/// Test cases name the expected condition by string; every condition the
/// client raises must map to exactly one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The server returned a CIM status code
    #[serde(rename = "CIMError")]
    CimError,
    /// The server returned a non-success HTTP status
    #[serde(rename = "HTTPError")]
    HttpError,
    /// The response could not be decoded
    ParseError,
    AuthError,
    ConnectionError,
    TimeoutError,
    /// An argument was rejected before a request was sent
    ValueError,
    TypeError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::CimError,
        ErrorKind::HttpError,
        ErrorKind::ParseError,
        ErrorKind::AuthError,
        ErrorKind::ConnectionError,
        ErrorKind::TimeoutError,
        ErrorKind::ValueError,
        ErrorKind::TypeError,
    ];

    /// Name used in test case files
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::CimError => "CIMError",
            ErrorKind::HttpError => "HTTPError",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::AuthError => "AuthError",
            ErrorKind::ConnectionError => "ConnectionError",
            ErrorKind::TimeoutError => "TimeoutError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::TypeError => "TypeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| format!("unknown error kind '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in ErrorKind::ALL {
            assert_eq!(kind.name().parse::<ErrorKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!("CIMErrorX".parse::<ErrorKind>().is_err());
        assert!("cimerror".parse::<ErrorKind>().is_err());
    }
}
