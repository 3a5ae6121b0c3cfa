//! Reset
//!
//! Sent by the CSMS to reset a whole charging station or a single EVSE.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ocpp_core::{
    CustomSerializers, EvseId, JsonReader, JsonWriter, OcppRequest, OcppResponse, OcppResult, ParseError,
    ParseOptions, RequestContext, RequestEnvelope, ResponseContext, ResponseEnvelope, Signature, ToJson,
};
use serde_json::Value;

use crate::types::{ResetStatus, ResetType, StatusInfo};

#[derive(Debug, Clone)]
pub struct ResetRequest {
    envelope: RequestEnvelope,
    reset_type: ResetType,
    evse_id: Option<EvseId>,
    hash_code: u64,
}

impl ResetRequest {
    /// Reset the whole charging station
    pub fn new(envelope: RequestEnvelope, reset_type: ResetType) -> Self {
        Self::build(envelope, reset_type, None)
    }

    pub fn for_evse(envelope: RequestEnvelope, reset_type: ResetType, evse_id: EvseId) -> Self {
        Self::build(envelope, reset_type, Some(evse_id))
    }

    fn build(envelope: RequestEnvelope, reset_type: ResetType, evse_id: Option<EvseId>) -> Self {
        let mut request = Self {
            envelope,
            reset_type,
            evse_id,
            hash_code: 0,
        };
        request.hash_code = request.compute_hash();
        request
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        self.reset_type.hash(&mut hasher);
        self.evse_id.hash(&mut hasher);
        hasher.finish()
    }

    pub fn reset_type(&self) -> ResetType {
        self.reset_type
    }

    pub fn evse_id(&self) -> Option<EvseId> {
        self.evse_id
    }
}

impl PartialEq for ResetRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.reset_type == other.reset_type
            && self.evse_id == other.evse_id
    }
}

impl Eq for ResetRequest {}

impl Hash for ResetRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for ResetRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.envelope, self.reset_type)?;
        match self.evse_id {
            Some(evse_id) => write!(f, " EVSE {}", evse_id),
            None => f.write_str(" station"),
        }
    }
}

impl ToJson for ResetRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .enumeration("type", &self.reset_type)
            .optional("evseId", self.evse_id.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppRequest for ResetRequest {
    const ACTION: &'static str = "Reset";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "reset request")?;

        let reset_type = reader.mandatory_enum("type", "reset type", "ResetType")?;
        let evse_id = reader.optional::<EvseId>("evseId", "EVSE id")?;

        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;

        options.parsers.apply(json, Self::build(envelope, reset_type, evse_id))
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct ResetResponse {
    envelope: ResponseEnvelope<ResetRequest>,
    status: ResetStatus,
    status_info: Option<StatusInfo>,
}

impl ResetResponse {
    pub fn new(request: Arc<ResetRequest>, status: ResetStatus) -> Self {
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

    pub fn status(&self) -> ResetStatus {
        self.status
    }

    pub fn status_info(&self) -> Option<&StatusInfo> {
        self.status_info.as_ref()
    }
}

impl PartialEq for ResetResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.status == other.status
            && self.status_info == other.status_info
    }
}

impl Eq for ResetResponse {}

impl Hash for ResetResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
        self.status.hash(state);
        self.status_info.hash(state);
    }
}

impl fmt::Display for ResetResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.envelope, self.status)
    }
}

impl ToJson for ResetResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .enumeration("status", &self.status)
            .optional("statusInfo", self.status_info.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppResponse for ResetResponse {
    type Request = ResetRequest;

    fn envelope(&self) -> &ResponseEnvelope<ResetRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<ResetRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "reset response")?;

        let status = reader.mandatory_enum("status", "reset status", "ResetStatus")?;
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

    fn failed_with(request: Arc<ResetRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
            status: ResetStatus::default(),
            status_info: None,
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}
