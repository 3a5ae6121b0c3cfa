//! StatusNotification
//!
//! Reports a connector status change. The response carries no payload.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ocpp_core::{
    ConnectorId, CustomSerializers, EvseId, JsonReader, JsonWriter, OcppRequest, OcppResponse, OcppResult,
    ParseError, ParseOptions, RequestContext, RequestEnvelope, ResponseContext, ResponseEnvelope, Signature, ToJson,
};
use serde_json::Value;

use crate::types::ConnectorStatus;

#[derive(Debug, Clone)]
pub struct StatusNotificationRequest {
    envelope: RequestEnvelope,
    timestamp: DateTime<Utc>,
    connector_status: ConnectorStatus,
    evse_id: EvseId,
    connector_id: ConnectorId,
    hash_code: u64,
}

impl StatusNotificationRequest {
    pub fn new(
        envelope: RequestEnvelope,
        timestamp: DateTime<Utc>,
        connector_status: ConnectorStatus,
        evse_id: EvseId,
        connector_id: ConnectorId,
    ) -> Self {
        let mut request = Self {
            envelope,
            timestamp,
            connector_status,
            evse_id,
            connector_id,
            hash_code: 0,
        };
        request.hash_code = request.compute_hash();
        request
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        self.timestamp.hash(&mut hasher);
        self.connector_status.hash(&mut hasher);
        self.evse_id.hash(&mut hasher);
        self.connector_id.hash(&mut hasher);
        hasher.finish()
    }

    /// Time of the status change, as reported by the station
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn connector_status(&self) -> ConnectorStatus {
        self.connector_status
    }

    pub fn evse_id(&self) -> EvseId {
        self.evse_id
    }

    pub fn connector_id(&self) -> ConnectorId {
        self.connector_id
    }
}

impl PartialEq for StatusNotificationRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.timestamp == other.timestamp
            && self.connector_status == other.connector_status
            && self.evse_id == other.evse_id
            && self.connector_id == other.connector_id
    }
}

impl Eq for StatusNotificationRequest {}

impl Hash for StatusNotificationRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for StatusNotificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: EVSE {} connector {} {:?}",
            self.envelope, self.evse_id, self.connector_id, self.connector_status
        )
    }
}

impl ToJson for StatusNotificationRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .field("timestamp", &self.timestamp)
            .enumeration("connectorStatus", &self.connector_status)
            .field("evseId", &self.evse_id)
            .field("connectorId", &self.connector_id);
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppRequest for StatusNotificationRequest {
    const ACTION: &'static str = "StatusNotification";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "status notification request")?;

        let timestamp = reader.mandatory::<DateTime<Utc>>("timestamp", "status change timestamp")?;
        let connector_status = reader.mandatory_enum("connectorStatus", "connector status", "ConnectorStatus")?;
        let evse_id = reader.mandatory::<EvseId>("evseId", "EVSE id")?;
        let connector_id = reader.mandatory::<ConnectorId>("connectorId", "connector id")?;

        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;

        options.parsers.apply(
            json,
            Self::new(envelope, timestamp, connector_status, evse_id, connector_id),
        )
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct StatusNotificationResponse {
    envelope: ResponseEnvelope<StatusNotificationRequest>,
}

impl StatusNotificationResponse {
    pub fn new(request: Arc<StatusNotificationRequest>) -> Self {
        Self {
            envelope: ResponseEnvelope::ok(request),
        }
    }
}

impl PartialEq for StatusNotificationResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
    }
}

impl Eq for StatusNotificationResponse {}

impl Hash for StatusNotificationResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
    }
}

impl fmt::Display for StatusNotificationResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.envelope)
    }
}

impl ToJson for StatusNotificationResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = self.envelope.write_into(JsonWriter::new(serializers)).finish();
        serializers.apply(self, json)
    }
}

impl OcppResponse for StatusNotificationResponse {
    type Request = StatusNotificationRequest;

    fn envelope(&self) -> &ResponseEnvelope<StatusNotificationRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<StatusNotificationRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "status notification response")?;
        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;
        options.parsers.apply(json, Self { envelope })
    }

    fn failed_with(request: Arc<StatusNotificationRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, envelope, options, ChecksumSigner};
    use ocpp_core::{ParserConfig, SignInfo, SignatureError};
    use serde_json::json;

    fn status_json() -> Value {
        json!({
            "timestamp": "2026-01-20T12:00:00Z",
            "connectorStatus": "Occupied",
            "evseId": 1,
            "connectorId": 2
        })
    }

    #[test]
    fn test_parse_request() {
        let request = StatusNotificationRequest::try_parse(&status_json(), &context(), &options()).unwrap();

        assert_eq!(request.connector_status(), ConnectorStatus::Occupied);
        assert_eq!(request.evse_id(), EvseId::new(1));
        assert_eq!(request.connector_id().value(), 2);
        assert_eq!(request.to_json(), status_json());
    }

    #[test]
    fn test_connector_zero_rejected() {
        let mut json = status_json();
        json["connectorId"] = json!(0);
        let err = StatusNotificationRequest::try_parse(&json, &context(), &options()).unwrap_err();
        assert!(matches!(&err, ParseError::InvalidField { key, .. } if key == "connectorId"));
    }

    #[test]
    fn test_bad_timestamp() {
        let mut json = status_json();
        json["timestamp"] = json!("yesterday");
        let err = StatusNotificationRequest::try_parse(&json, &context(), &options()).unwrap_err();
        assert!(err.to_string().contains("timestamp"));
    }

    #[test]
    fn test_sign_and_verify() {
        let envelope = envelope("StatusNotification").with_sign_infos(vec![SignInfo::new("station-key")]);
        let request = StatusNotificationRequest::new(
            envelope,
            "2026-01-20T12:00:00Z".parse().unwrap(),
            ConnectorStatus::Available,
            EvseId::new(1),
            ConnectorId::try_new(1).unwrap(),
        );

        assert_eq!(request.verify_signatures(&ChecksumSigner), Err(SignatureError::Unsigned));

        let signed = request.clone().sign(&ChecksumSigner).unwrap();
        assert_eq!(signed.envelope().signatures().len(), 1);
        assert_ne!(signed, request);
        assert!(signed.verify_signatures(&ChecksumSigner).is_ok());

        // Signatures survive the wire and still verify
        let reparsed = StatusNotificationRequest::try_parse(&signed.to_json(), &context(), &options()).unwrap();
        assert_eq!(reparsed, signed);
        assert!(reparsed.verify_signatures(&ChecksumSigner).is_ok());

        let mut tampered = signed.to_json();
        tampered["connectorStatus"] = json!("Faulted");
        let tampered = StatusNotificationRequest::try_parse(&tampered, &context(), &options()).unwrap();
        assert!(matches!(
            tampered.verify_signatures(&ChecksumSigner),
            Err(SignatureError::VerificationFailed { .. })
        ));
    }

    #[test]
    fn test_signature_limit() {
        let signatures: Vec<Value> = (0..3)
            .map(|i| json!({ "keyId": format!("k{}", i), "value": "00" }))
            .collect();
        let mut json = status_json();
        json["signatures"] = Value::Array(signatures);

        let options = ParseOptions::new(ParserConfig::default().with_max_signatures(2));
        let err = StatusNotificationRequest::try_parse(&json, &context(), &options).unwrap_err();
        assert!(matches!(err, ParseError::TooManyElements { max: 2, len: 3, .. }));
    }

    #[test]
    fn test_empty_response() {
        let request = Arc::new(StatusNotificationRequest::try_parse(&status_json(), &context(), &options()).unwrap());
        let response = StatusNotificationResponse::new(request.clone());
        assert_eq!(response.to_json(), json!({}));
        assert_eq!(response.request(), &request);
        assert_ne!(response, StatusNotificationResponse::failed(request));
    }
}
