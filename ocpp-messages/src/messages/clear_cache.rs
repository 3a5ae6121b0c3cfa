//! ClearCache

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ocpp_core::{
    CustomSerializers, JsonReader, JsonWriter, OcppRequest, OcppResponse, OcppResult, ParseError, ParseOptions,
    RequestContext, RequestEnvelope, ResponseContext, ResponseEnvelope, Signature, ToJson,
};
use serde_json::Value;

use crate::types::{ClearCacheStatus, StatusInfo};

/// Asks a charging station to clear its authorization cache
#[derive(Debug, Clone)]
pub struct ClearCacheRequest {
    envelope: RequestEnvelope,
    hash_code: u64,
}

impl ClearCacheRequest {
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

impl PartialEq for ClearCacheRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
    }
}

impl Eq for ClearCacheRequest {}

impl Hash for ClearCacheRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for ClearCacheRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.envelope)
    }
}

impl ToJson for ClearCacheRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = self.envelope.write_into(JsonWriter::new(serializers)).finish();
        serializers.apply(self, json)
    }
}

impl OcppRequest for ClearCacheRequest {
    const ACTION: &'static str = "ClearCache";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "clear cache request")?;
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
pub struct ClearCacheResponse {
    envelope: ResponseEnvelope<ClearCacheRequest>,
    status: ClearCacheStatus,
    status_info: Option<StatusInfo>,
}

impl ClearCacheResponse {
    pub fn new(request: Arc<ClearCacheRequest>, status: ClearCacheStatus) -> Self {
        Self {
            envelope: ResponseEnvelope::ok(request),
            status,
            status_info: None,
        }
    }

    pub fn with_status_info(mut self, status_info: StatusInfo) -> Self {
        self.status_info = Some(status_info);
        self
    }

    pub fn status(&self) -> ClearCacheStatus {
        self.status
    }

    pub fn status_info(&self) -> Option<&StatusInfo> {
        self.status_info.as_ref()
    }
}

impl PartialEq for ClearCacheResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.status == other.status
            && self.status_info == other.status_info
    }
}

impl Eq for ClearCacheResponse {}

impl Hash for ClearCacheResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
        self.status.hash(state);
        self.status_info.hash(state);
    }
}

impl fmt::Display for ClearCacheResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.envelope, self.status)
    }
}

impl ToJson for ClearCacheResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .enumeration("status", &self.status)
            .optional("statusInfo", self.status_info.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppResponse for ClearCacheResponse {
    type Request = ClearCacheRequest;

    fn envelope(&self) -> &ResponseEnvelope<ClearCacheRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<ClearCacheRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "clear cache response")?;

        let status = reader.mandatory_enum("status", "clear cache status", "ClearCacheStatus")?;
        let status_info = reader.optional::<StatusInfo>("statusInfo", "status info")?;

        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;

        options.parsers.apply(
            json,
            Self {
                envelope,
                status,
                status_info,
            },
        )
    }

    fn failed_with(request: Arc<ClearCacheRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
            status: ClearCacheStatus::default(),
            status_info: None,
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}
