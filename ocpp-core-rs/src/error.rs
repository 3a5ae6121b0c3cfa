//! Error types for the OCPP message layer
//!
//! `ParseError` is what every `try_parse` reports: a descriptive, field-named
//! failure that never escapes as a panic. `OcppError` is the umbrella returned by
//! the `parse` wrappers and by identifier parsing.

use thiserror::Error;

/// Failure while turning JSON into a typed OCPP value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("the JSON representation of {name} must be an object")]
    NotAnObject { name: String },

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("missing mandatory field '{key}' ({name})")]
    MissingField { key: String, name: String },

    #[error("invalid field '{key}' ({name}): {source}")]
    InvalidField {
        key: String,
        name: String,
        source: Box<ParseError>,
    },

    #[error("invalid element #{index}: {source}")]
    InvalidElement { index: usize, source: Box<ParseError> },

    #[error("field '{key}' ({name}) must contain at least one element")]
    EmptyCollection { key: String, name: String },

    #[error("field '{key}' ({name}) accepts at most {max} elements, got {len}")]
    TooManyElements {
        key: String,
        name: String,
        max: usize,
        len: usize,
    },

    #[error("expected a JSON {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown value '{value}' for {type_name}")]
    UnknownEnumValue { value: String, type_name: &'static str },

    #[error("{0}")]
    InvalidValue(String),

    #[error("request id mismatch: response carries '{response}', request is '{request}'")]
    CorrelationMismatch { request: String, response: String },

    #[error("custom parser for {type_name} failed: {reason}")]
    Delegate {
        type_name: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

impl ParseError {
    pub fn missing(key: &str, name: &str) -> Self {
        ParseError::MissingField {
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    pub fn invalid(key: &str, name: &str, source: ParseError) -> Self {
        ParseError::InvalidField {
            key: key.to_string(),
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    pub fn unexpected_type(expected: &'static str, found: &serde_json::Value) -> Self {
        ParseError::UnexpectedType {
            expected,
            found: json_type_name(found),
        }
    }

    /// Innermost error, following nested field and element wrappers
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::InvalidField { source, .. } | ParseError::InvalidElement { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

/// Name of a JSON value's type as used in error messages
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Invariant violation when a message is built programmatically
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("'{field}' must contain at least one element")]
    EmptyCollection { field: &'static str },

    #[error("'{field}' accepts at most {max} elements, got {len}")]
    TooManyElements {
        field: &'static str,
        max: usize,
        len: usize,
    },

    #[error("invalid argument '{field}': {reason}")]
    InvalidArgument { field: &'static str, reason: String },
}

/// Errors reported by signing and verification collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signing with key '{key_id}' failed: {reason}")]
    SigningFailed { key_id: String, reason: String },

    #[error("signature with key '{key_id}' did not verify")]
    VerificationFailed { key_id: String },

    #[error("message carries no signatures")]
    Unsigned,
}

/// Errors in OCPP message handling
#[derive(Debug, Error)]
pub enum OcppError {
    #[error("could not parse {type_name}: {source}")]
    Parse {
        type_name: &'static str,
        source: ParseError,
    },

    #[error("invalid construction: {0}")]
    Construction(#[from] ConstructionError),

    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl OcppError {
    pub fn parse(type_name: &'static str, source: ParseError) -> Self {
        OcppError::Parse { type_name, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_names_every_level() {
        let err = ParseError::invalid(
            "idToken",
            "identification token",
            ParseError::missing("type", "token type"),
        );

        let text = err.to_string();
        assert!(text.contains("idToken"));
        assert!(text.contains("type"));
        assert_eq!(err.root_cause(), &ParseError::missing("type", "token type"));
    }

    #[test]
    fn test_unexpected_type_reports_found_type() {
        let err = ParseError::unexpected_type("string", &serde_json::json!(42));
        assert_eq!(err.to_string(), "expected a JSON string, found number");
    }
}
