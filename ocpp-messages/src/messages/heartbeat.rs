//! Heartbeat
//!
//! Lets the CSMS know a charging station is still connected and returns the
//! CSMS clock for time synchronisation.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ocpp_core::{
    CustomSerializers, JsonReader, JsonWriter, OcppRequest, OcppResponse, OcppResult, ParseError, ParseOptions,
    RequestContext, RequestEnvelope, ResponseContext, ResponseEnvelope, Signature, ToJson,
};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HeartbeatRequest {
    envelope: RequestEnvelope,
    hash_code: u64,
}

impl HeartbeatRequest {
    pub fn new(envelope: RequestEnvelope) -> Self {
        let mut request = Self { envelope, hash_code: 0 };
        request.hash_code = request.compute_hash();
        request
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for HeartbeatRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
    }
}

impl Eq for HeartbeatRequest {}

impl Hash for HeartbeatRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for HeartbeatRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.envelope)
    }
}

impl ToJson for HeartbeatRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = self.envelope.write_into(JsonWriter::new(serializers)).finish();
        serializers.apply(self, json)
    }
}

impl OcppRequest for HeartbeatRequest {
    const ACTION: &'static str = "Heartbeat";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "heartbeat request")?;
        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;
        options.parsers.apply(json, Self::new(envelope))
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct HeartbeatResponse {
    envelope: ResponseEnvelope<HeartbeatRequest>,
    current_time: DateTime<Utc>,
}

impl HeartbeatResponse {
    pub fn new(request: Arc<HeartbeatRequest>, current_time: DateTime<Utc>) -> Self {
        Self {
            envelope: ResponseEnvelope::ok(request),
            current_time,
        }
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }
}

impl PartialEq for HeartbeatResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope) && self.current_time == other.current_time
    }
}

impl Eq for HeartbeatResponse {}

impl Hash for HeartbeatResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
        self.current_time.hash(state);
    }
}

impl fmt::Display for HeartbeatResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.envelope, self.current_time.to_rfc3339())
    }
}

impl ToJson for HeartbeatResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers).field("currentTime", &self.current_time);
        let json = self.envelope.write_into(writer).finish();
        serializers.apply(self, json)
    }
}

impl OcppResponse for HeartbeatResponse {
    type Request = HeartbeatRequest;

    fn envelope(&self) -> &ResponseEnvelope<HeartbeatRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<HeartbeatRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "heartbeat response")?;
        let current_time = reader.mandatory::<DateTime<Utc>>("currentTime", "current time")?;
        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;
        options.parsers.apply(json, Self { envelope, current_time })
    }

    fn failed_with(request: Arc<HeartbeatRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
            current_time: DateTime::<Utc>::default(),
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}
