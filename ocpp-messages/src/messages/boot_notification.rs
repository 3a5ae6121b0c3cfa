//! BootNotification
//!
//! First message a charging station sends after (re)starting. The CSMS answers
//! with its clock, a registration status and the heartbeat interval to use.

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

use crate::types::{BootReason, ChargingStation, RegistrationStatus, StatusInfo};

#[derive(Debug, Clone)]
pub struct BootNotificationRequest {
    envelope: RequestEnvelope,
    charging_station: ChargingStation,
    reason: BootReason,
    hash_code: u64,
}

impl BootNotificationRequest {
    pub fn new(envelope: RequestEnvelope, charging_station: ChargingStation, reason: BootReason) -> Self {
        let mut request = Self {
            envelope,
            charging_station,
            reason,
            hash_code: 0,
        };
        request.hash_code = request.compute_hash();
        request
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        self.charging_station.hash(&mut hasher);
        self.reason.hash(&mut hasher);
        hasher.finish()
    }

    pub fn charging_station(&self) -> &ChargingStation {
        &self.charging_station
    }

    pub fn reason(&self) -> BootReason {
        self.reason
    }
}

impl PartialEq for BootNotificationRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.charging_station == other.charging_station
            && self.reason == other.reason
    }
}

impl Eq for BootNotificationRequest {}

impl Hash for BootNotificationRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for BootNotificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({:?})", self.envelope, self.charging_station, self.reason)
    }
}

impl ToJson for BootNotificationRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .field("chargingStation", &self.charging_station)
            .enumeration("reason", &self.reason);
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppRequest for BootNotificationRequest {
    const ACTION: &'static str = "BootNotification";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "boot notification request")?;

        let charging_station = reader.mandatory::<ChargingStation>("chargingStation", "charging station")?;
        let reason = reader.mandatory_enum("reason", "boot reason", "BootReason")?;

        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;

        options
            .parsers
            .apply(json, Self::new(envelope, charging_station, reason))
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct BootNotificationResponse {
    envelope: ResponseEnvelope<BootNotificationRequest>,
    current_time: DateTime<Utc>,
    interval: i32,
    status: RegistrationStatus,
    status_info: Option<StatusInfo>,
}

impl BootNotificationResponse {
    pub fn new(
        request: Arc<BootNotificationRequest>,
        current_time: DateTime<Utc>,
        interval: i32,
        status: RegistrationStatus,
    ) -> Self {
        Self {
            envelope: ResponseEnvelope::ok(request),
            current_time,
            interval,
            status,
            status_info: None,
        }
    }

    pub fn with_status_info(mut self, status_info: StatusInfo) -> Self {
        self.status_info = Some(status_info);
        self
    }

    pub fn current_time(&self) -> DateTime<Utc> {
        self.current_time
    }

    /// Heartbeat interval in seconds while accepted, retry delay otherwise
    pub fn interval(&self) -> i32 {
        self.interval
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn status_info(&self) -> Option<&StatusInfo> {
        self.status_info.as_ref()
    }
}

impl PartialEq for BootNotificationResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.current_time == other.current_time
            && self.interval == other.interval
            && self.status == other.status
            && self.status_info == other.status_info
    }
}

impl Eq for BootNotificationResponse {}

impl Hash for BootNotificationResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
        self.current_time.hash(state);
        self.interval.hash(state);
        self.status.hash(state);
        self.status_info.hash(state);
    }
}

impl fmt::Display for BootNotificationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}, interval {}s", self.envelope, self.status, self.interval)
    }
}

impl ToJson for BootNotificationResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .field("currentTime", &self.current_time)
            .field("interval", &self.interval)
            .enumeration("status", &self.status)
            .optional("statusInfo", self.status_info.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppResponse for BootNotificationResponse {
    type Request = BootNotificationRequest;

    fn envelope(&self) -> &ResponseEnvelope<BootNotificationRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<BootNotificationRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "boot notification response")?;

        let current_time = reader.mandatory::<DateTime<Utc>>("currentTime", "current time")?;
        let interval = reader.mandatory::<i32>("interval", "heartbeat interval")?;
        let status = reader.mandatory_enum("status", "registration status", "RegistrationStatus")?;
        let status_info = reader.optional::<StatusInfo>("statusInfo", "status info")?;

        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;

        options.parsers.apply(
            json,
            Self {
                envelope,
                current_time,
                interval,
                status,
                status_info,
            },
        )
    }

    fn failed_with(request: Arc<BootNotificationRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
            current_time: DateTime::<Utc>::default(),
            interval: 0,
            status: RegistrationStatus::default(),
            status_info: None,
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}
