//! RPC error values for the transport boundary
//!
//! A failed `try_parse` must become a protocol-level error answer instead of
//! tearing down the connection. `RpcError` carries what a CALLERROR frame needs
//! (`[4, messageId, errorCode, errorDescription, errorDetails]`); framing the
//! array is the transport's job.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ParseError;
use crate::result::{OcppResult, ResultCode};

/// OCPP RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcErrorCode {
    FormatViolation,
    GenericError,
    InternalError,
    MessageTypeNotSupported,
    NotImplemented,
    NotSupported,
    OccurrenceConstraintViolation,
    PropertyConstraintViolation,
    ProtocolError,
    RpcFrameworkError,
    SecurityError,
    TypeConstraintViolation,
}

impl RpcErrorCode {
    pub const ALL: [RpcErrorCode; 12] = [
        RpcErrorCode::FormatViolation,
        RpcErrorCode::GenericError,
        RpcErrorCode::InternalError,
        RpcErrorCode::MessageTypeNotSupported,
        RpcErrorCode::NotImplemented,
        RpcErrorCode::NotSupported,
        RpcErrorCode::OccurrenceConstraintViolation,
        RpcErrorCode::PropertyConstraintViolation,
        RpcErrorCode::ProtocolError,
        RpcErrorCode::RpcFrameworkError,
        RpcErrorCode::SecurityError,
        RpcErrorCode::TypeConstraintViolation,
    ];
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error answer for a request that could not be processed
#[derive(Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: RpcErrorCode,
    pub description: String,
    pub details: Value,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            details: Value::Object(serde_json::Map::new()),
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

impl From<&ParseError> for RpcError {
    fn from(error: &ParseError) -> Self {
        let code = match error.root_cause() {
            ParseError::MalformedJson(_) | ParseError::NotAnObject { .. } => RpcErrorCode::FormatViolation,
            ParseError::MissingField { .. }
            | ParseError::EmptyCollection { .. }
            | ParseError::TooManyElements { .. } => RpcErrorCode::OccurrenceConstraintViolation,
            ParseError::UnexpectedType { .. } => RpcErrorCode::TypeConstraintViolation,
            ParseError::UnknownEnumValue { .. }
            | ParseError::InvalidValue(_)
            | ParseError::Construction(_) => RpcErrorCode::PropertyConstraintViolation,
            ParseError::CorrelationMismatch { .. } => RpcErrorCode::ProtocolError,
            ParseError::Delegate { .. } => RpcErrorCode::InternalError,
            ParseError::InvalidField { .. } | ParseError::InvalidElement { .. } => RpcErrorCode::GenericError,
        };

        let details = match error {
            ParseError::InvalidField { key, .. } | ParseError::MissingField { key, .. } => json!({ "field": key }),
            _ => Value::Object(serde_json::Map::new()),
        };

        RpcError::new(code, error.to_string()).with_details(details)
    }
}

impl From<&RpcError> for OcppResult {
    fn from(error: &RpcError) -> Self {
        let code = match error.code {
            RpcErrorCode::FormatViolation
            | RpcErrorCode::OccurrenceConstraintViolation
            | RpcErrorCode::PropertyConstraintViolation
            | RpcErrorCode::TypeConstraintViolation => ResultCode::FormatViolation,
            RpcErrorCode::ProtocolError
            | RpcErrorCode::RpcFrameworkError
            | RpcErrorCode::MessageTypeNotSupported => ResultCode::ProtocolError,
            RpcErrorCode::SecurityError => ResultCode::SignatureError,
            RpcErrorCode::NotImplemented | RpcErrorCode::NotSupported => ResultCode::NotImplemented,
            RpcErrorCode::GenericError | RpcErrorCode::InternalError => ResultCode::ServerError,
        };

        OcppResult::new(code, error.description.clone()).with_details(error.details.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_maps_to_occurrence_violation() {
        let err = ParseError::missing("idToken", "identification token");
        let rpc = RpcError::from(&err);

        assert_eq!(rpc.code, RpcErrorCode::OccurrenceConstraintViolation);
        assert!(rpc.description.contains("idToken"));
        assert_eq!(rpc.details, json!({ "field": "idToken" }));
    }

    #[test]
    fn test_nested_type_error_uses_root_cause() {
        let err = ParseError::invalid(
            "evseId",
            "EVSE id",
            ParseError::unexpected_type("integer", &json!("one")),
        );
        assert_eq!(RpcError::from(&err).code, RpcErrorCode::TypeConstraintViolation);
    }

    #[test]
    fn test_rpc_error_to_result() {
        let rpc = RpcError::new(RpcErrorCode::InternalError, "database offline");
        let result = OcppResult::from(&rpc);

        assert_eq!(result.code, ResultCode::ServerError);
        assert_eq!(result.description.as_deref(), Some("database offline"));
    }

    #[test]
    fn test_error_code_serializes_as_name() {
        let code: RpcErrorCode = serde_json::from_value(json!("NotImplemented")).unwrap();
        assert_eq!(code, RpcErrorCode::NotImplemented);
        assert_eq!(serde_json::to_value(RpcErrorCode::SecurityError).unwrap(), json!("SecurityError"));
    }
}
