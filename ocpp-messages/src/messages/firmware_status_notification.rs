//! FirmwareStatusNotification
//!
//! Progress report for a firmware update started by UpdateFirmware. The
//! response carries no payload.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ocpp_core::{
    CustomSerializers, JsonReader, JsonWriter, OcppRequest, OcppResponse, OcppResult, ParseError, ParseOptions,
    RequestContext, RequestEnvelope, ResponseContext, ResponseEnvelope, Signature, ToJson,
};
use serde_json::Value;

use crate::types::{FirmwareStatus, StatusInfo};

#[derive(Debug, Clone)]
pub struct FirmwareStatusNotificationRequest {
    envelope: RequestEnvelope,
    status: FirmwareStatus,
    update_request_id: Option<i32>,
    status_info: Option<StatusInfo>,
    hash_code: u64,
}

impl FirmwareStatusNotificationRequest {
    pub fn new(envelope: RequestEnvelope, status: FirmwareStatus) -> Self {
        Self::build(envelope, status, None, None)
    }

    /// Notification tied to the `requestId` of the UpdateFirmware request
    pub fn for_update(
        envelope: RequestEnvelope,
        status: FirmwareStatus,
        update_request_id: i32,
        status_info: Option<StatusInfo>,
    ) -> Self {
        Self::build(envelope, status, Some(update_request_id), status_info)
    }

    fn build(
        envelope: RequestEnvelope,
        status: FirmwareStatus,
        update_request_id: Option<i32>,
        status_info: Option<StatusInfo>,
    ) -> Self {
        let mut request = Self {
            envelope,
            status,
            update_request_id,
            status_info,
            hash_code: 0,
        };
        request.hash_code = request.compute_hash();
        request
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        self.status.hash(&mut hasher);
        self.update_request_id.hash(&mut hasher);
        self.status_info.hash(&mut hasher);
        hasher.finish()
    }

    pub fn status(&self) -> FirmwareStatus {
        self.status
    }

    pub fn update_request_id(&self) -> Option<i32> {
        self.update_request_id
    }

    pub fn status_info(&self) -> Option<&StatusInfo> {
        self.status_info.as_ref()
    }
}

impl PartialEq for FirmwareStatusNotificationRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.status == other.status
            && self.update_request_id == other.update_request_id
            && self.status_info == other.status_info
    }
}

impl Eq for FirmwareStatusNotificationRequest {}

impl Hash for FirmwareStatusNotificationRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for FirmwareStatusNotificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.envelope, self.status)?;
        if let Some(id) = self.update_request_id {
            write!(f, " (update {})", id)?;
        }
        Ok(())
    }
}

impl ToJson for FirmwareStatusNotificationRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .enumeration("status", &self.status)
            .optional("requestId", self.update_request_id.as_ref())
            .optional("statusInfo", self.status_info.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppRequest for FirmwareStatusNotificationRequest {
    const ACTION: &'static str = "FirmwareStatusNotification";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "firmware status notification request")?;

        let status = reader.mandatory_enum("status", "firmware status", "FirmwareStatus")?;
        let update_request_id = reader.optional::<i32>("requestId", "firmware update request id")?;
        let status_info = reader.optional::<StatusInfo>("statusInfo", "status info")?;

        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;

        options
            .parsers
            .apply(json, Self::build(envelope, status, update_request_id, status_info))
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct FirmwareStatusNotificationResponse {
    envelope: ResponseEnvelope<FirmwareStatusNotificationRequest>,
}

impl FirmwareStatusNotificationResponse {
    pub fn new(request: Arc<FirmwareStatusNotificationRequest>) -> Self {
        Self {
            envelope: ResponseEnvelope::ok(request),
        }
    }
}

impl PartialEq for FirmwareStatusNotificationResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
    }
}

impl Eq for FirmwareStatusNotificationResponse {}

impl Hash for FirmwareStatusNotificationResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
    }
}

impl fmt::Display for FirmwareStatusNotificationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.envelope)
    }
}

impl ToJson for FirmwareStatusNotificationResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = self.envelope.write_into(JsonWriter::new(serializers)).finish();
        serializers.apply(self, json)
    }
}

impl OcppResponse for FirmwareStatusNotificationResponse {
    type Request = FirmwareStatusNotificationRequest;

    fn envelope(&self) -> &ResponseEnvelope<FirmwareStatusNotificationRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<FirmwareStatusNotificationRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "firmware status notification response")?;
        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;
        options.parsers.apply(json, Self { envelope })
    }

    fn failed_with(request: Arc<FirmwareStatusNotificationRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}
