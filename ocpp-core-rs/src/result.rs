//! Outcome of a request/response exchange

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;

/// Result classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResultCode {
    #[default]
    Ok,
    FormatViolation,
    ProtocolError,
    SignatureError,
    ServerError,
    Timeout,
    NetworkError,
    NotImplemented,
    Filtered,
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Success or fault of an exchange, carried by every response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcppResult {
    pub code: ResultCode,
    pub description: Option<String>,
    pub details: Option<Value>,
}

impl OcppResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn new(code: ResultCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: Some(description.into()),
            details: None,
        }
    }

    pub fn server_error(description: impl Into<String>) -> Self {
        Self::new(ResultCode::ServerError, description)
    }

    pub fn format_violation(description: impl Into<String>) -> Self {
        Self::new(ResultCode::FormatViolation, description)
    }

    pub fn from_parse_error(error: &ParseError) -> Self {
        let code = match error.root_cause() {
            ParseError::CorrelationMismatch { .. } => ResultCode::ProtocolError,
            ParseError::Delegate { .. } => ResultCode::ServerError,
            _ => ResultCode::FormatViolation,
        };
        Self::new(code, error.to_string())
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.code == ResultCode::Ok
    }

    /// Both succeeded or both failed, whatever the failure code
    pub fn same_outcome(&self, other: &OcppResult) -> bool {
        self.is_ok() == other.is_ok()
    }
}

impl fmt::Display for OcppResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(description) => write!(f, "{}: {}", self.code, description),
            None => write!(f, "{}", self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_result() {
        let result = OcppResult::ok();
        assert!(result.is_ok());
        assert_eq!(result.to_string(), "Ok");
    }

    #[test]
    fn test_parse_error_maps_to_format_violation() {
        let err = ParseError::invalid("idToken", "id token", ParseError::missing("type", "type"));
        let result = OcppResult::from_parse_error(&err);

        assert_eq!(result.code, ResultCode::FormatViolation);
        assert!(!result.is_ok());
        assert!(result.description.unwrap().contains("idToken"));
    }

    #[test]
    fn test_correlation_error_is_protocol_error() {
        let err = ParseError::CorrelationMismatch {
            request: "a".into(),
            response: "b".into(),
        };
        assert_eq!(OcppResult::from_parse_error(&err).code, ResultCode::ProtocolError);
    }

    #[test]
    fn test_same_outcome_ignores_failure_code() {
        let server = OcppResult::server_error("database offline");
        let format = OcppResult::format_violation("bad payload");

        assert!(server.same_outcome(&format));
        assert!(OcppResult::ok().same_outcome(&OcppResult::ok()));
        assert!(!OcppResult::ok().same_outcome(&server));
    }
}
