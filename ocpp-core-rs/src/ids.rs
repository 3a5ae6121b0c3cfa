//! Identifier and value types shared by every OCPP message

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use uuid::Uuid;

use crate::custom::{CustomParsers, CustomSerializers};
use crate::error::{OcppError, ParseError};
use crate::json::{parse_array, FromJson, ToJson};

/// Defines a trimmed, non-empty, length-limited string identifier
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal, $max_len:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            pub const MAX_LENGTH: usize = $max_len;

            pub fn try_parse(text: &str) -> Result<Self, ParseError> {
                let text = text.trim();
                if text.is_empty() {
                    return Err(ParseError::InvalidValue(format!("{} must not be empty", $label)));
                }
                if text.chars().count() > Self::MAX_LENGTH {
                    return Err(ParseError::InvalidValue(format!(
                        "{} '{}' exceeds {} characters",
                        $label,
                        text,
                        Self::MAX_LENGTH
                    )));
                }
                Ok(Self(text.to_string()))
            }

            pub fn parse(text: &str) -> Result<Self, OcppError> {
                Self::try_parse(text).map_err(|e| OcppError::parse($label, e))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::try_parse(s)
            }
        }

        impl FromJson for $name {
            fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
                let text = String::from_json(json, parsers)?;
                Self::try_parse(&text)
            }
        }

        impl ToJson for $name {
            fn to_json_with(&self, _: &CustomSerializers) -> Value {
                Value::String(self.0.clone())
            }
        }
    };
}

string_identifier!(
    /// Correlates a request with its response; supplied by the transport layer
    RequestId,
    "request id",
    36
);

string_identifier!(
    /// Correlates every request and response belonging to one business operation
    EventTrackingId,
    "event tracking id",
    64
);

string_identifier!(
    /// Identity of a charging station, CSMS or intermediary networking node
    NetworkingNodeId,
    "networking node id",
    48
);

string_identifier!(
    /// Vendor identification, usually a reversed DNS name
    VendorId,
    "vendor id",
    255
);

impl RequestId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl EventTrackingId {
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// EVSE identifier; 0 addresses the whole charging station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvseId(u32);

impl EvseId {
    pub const STATION: EvseId = EvseId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn parse(text: &str) -> Result<Self, OcppError> {
        text.parse().map_err(|e| OcppError::parse("EVSE id", e))
    }
}

impl fmt::Display for EvseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EvseId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(EvseId)
            .map_err(|_| ParseError::InvalidValue(format!("'{}' is not a valid EVSE id", s)))
    }
}

impl FromJson for EvseId {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        u32::from_json(json, parsers).map(EvseId)
    }
}

impl ToJson for EvseId {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::from(self.0)
    }
}

/// Connector identifier, numbered from 1 within its EVSE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectorId(u32);

impl ConnectorId {
    pub fn try_new(id: u32) -> Result<Self, ParseError> {
        if id == 0 {
            return Err(ParseError::InvalidValue("connector id must be positive".to_string()));
        }
        Ok(Self(id))
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn parse(text: &str) -> Result<Self, OcppError> {
        text.parse().map_err(|e| OcppError::parse("connector id", e))
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConnectorId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidValue(format!("'{}' is not a valid connector id", s)))?;
        Self::try_new(id)
    }
}

impl FromJson for ConnectorId {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        Self::try_new(u32::from_json(json, parsers)?)
    }
}

impl ToJson for ConnectorId {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::from(self.0)
    }
}

/// Routing trace of a message through intermediary networking nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NetworkPath(Vec<NetworkingNodeId>);

impl NetworkPath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_origin(origin: NetworkingNodeId) -> Self {
        Self(vec![origin])
    }

    /// New path with `node` appended
    pub fn append(&self, node: NetworkingNodeId) -> Self {
        let mut nodes = self.0.clone();
        nodes.push(node);
        Self(nodes)
    }

    pub fn origin(&self) -> Option<&NetworkingNodeId> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&NetworkingNodeId> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nodes(&self) -> &[NetworkingNodeId] {
        &self.0
    }
}

impl fmt::Display for NetworkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<&str> = self.0.iter().map(NetworkingNodeId::as_str).collect();
        f.write_str(&nodes.join(" -> "))
    }
}

impl FromJson for NetworkPath {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        parse_array(json, parsers).map(Self)
    }
}

impl ToJson for NetworkPath {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        Value::Array(self.0.iter().map(|node| node.to_json_with(serializers)).collect())
    }
}
