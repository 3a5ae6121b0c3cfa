//! Minimal request/response pair for exercising the envelopes in unit tests

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::Value;

use crate::config::ParseOptions;
use crate::custom::CustomSerializers;
use crate::error::ParseError;
use crate::ids::{NetworkingNodeId, RequestId};
use crate::json::{JsonReader, JsonWriter, ToJson};
use crate::request::{OcppRequest, RequestContext, RequestEnvelope};
use crate::response::{OcppResponse, ResponseContext, ResponseEnvelope};
use crate::result::OcppResult;
use crate::signature::Signature;

#[derive(Debug, Clone)]
pub struct SampleRequest {
    pub envelope: RequestEnvelope,
    pub label: String,
    hash_code: u64,
}

impl SampleRequest {
    pub fn new(envelope: RequestEnvelope, label: impl Into<String>) -> Self {
        let mut request = Self {
            envelope,
            label: label.into(),
            hash_code: 0,
        };
        request.hash_code = request.compute_hash();
        request
    }

    pub fn sample() -> Self {
        let envelope = RequestEnvelope::new(NetworkingNodeId::try_parse("CS001").unwrap(), Self::ACTION)
            .with_request_id(RequestId::try_parse("sample-1").unwrap());
        Self::new(envelope, "hello")
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        self.label.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for SampleRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope) && self.label == other.label
    }
}

impl Eq for SampleRequest {}

impl Hash for SampleRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for SampleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl ToJson for SampleRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers).field("label", &self.label);
        let json = self.envelope.write_into(writer).finish();
        serializers.apply(self, json)
    }
}

impl OcppRequest for SampleRequest {
    const ACTION: &'static str = "Sample";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "sample request")?;
        let label = reader.mandatory::<String>("label", "sample label")?;
        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;
        options.parsers.apply(json, Self::new(envelope, label))
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct SampleResponse {
    pub envelope: ResponseEnvelope<SampleRequest>,
    pub echo: Option<String>,
}

impl PartialEq for SampleResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope) && self.echo == other.echo
    }
}

impl Eq for SampleResponse {}

impl Hash for SampleResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
        self.echo.hash(state);
    }
}

impl fmt::Display for SampleResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.envelope)
    }
}

impl ToJson for SampleResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers).optional("echo", self.echo.as_ref());
        let json = self.envelope.write_into(writer).finish();
        serializers.apply(self, json)
    }
}

impl OcppResponse for SampleResponse {
    type Request = SampleRequest;

    fn envelope(&self) -> &ResponseEnvelope<SampleRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<SampleRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "sample response")?;
        let echo = reader.optional::<String>("echo", "echo")?;
        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;
        options.parsers.apply(json, Self { envelope, echo })
    }

    fn failed_with(request: Arc<SampleRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
            echo: None,
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}
