//! DataTransfer
//!
//! Vendor-specific exchange in either direction. `data` is free-form JSON and
//! is carried through untouched.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ocpp_core::json::hash_json;
use ocpp_core::{
    CustomSerializers, JsonReader, JsonWriter, OcppRequest, OcppResponse, OcppResult, ParseError, ParseOptions,
    RequestContext, RequestEnvelope, ResponseContext, ResponseEnvelope, Signature, ToJson, VendorId,
};
use serde_json::Value;

use crate::types::{DataTransferStatus, StatusInfo};

const MAX_MESSAGE_ID_LENGTH: usize = 50;

fn hash_data<H: Hasher>(data: &Option<Value>, state: &mut H) {
    match data {
        Some(value) => hash_json(value, state),
        None => state.write_u8(0),
    }
}

#[derive(Debug, Clone)]
pub struct DataTransferRequest {
    envelope: RequestEnvelope,
    vendor_id: VendorId,
    message_id: Option<String>,
    data: Option<Value>,
    hash_code: u64,
}

impl DataTransferRequest {
    pub fn new(envelope: RequestEnvelope, vendor_id: VendorId) -> Self {
        Self::build(envelope, vendor_id, None, None)
    }

    pub fn with_message(
        envelope: RequestEnvelope,
        vendor_id: VendorId,
        message_id: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self::build(envelope, vendor_id, Some(message_id.into()), data)
    }

    fn build(envelope: RequestEnvelope, vendor_id: VendorId, message_id: Option<String>, data: Option<Value>) -> Self {
        let mut request = Self {
            envelope,
            vendor_id,
            message_id,
            data,
            hash_code: 0,
        };
        request.hash_code = request.compute_hash();
        request
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        self.vendor_id.hash(&mut hasher);
        self.message_id.hash(&mut hasher);
        hash_data(&self.data, &mut hasher);
        hasher.finish()
    }

    pub fn vendor_id(&self) -> &VendorId {
        &self.vendor_id
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl PartialEq for DataTransferRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.vendor_id == other.vendor_id
            && self.message_id == other.message_id
            && self.data == other.data
    }
}

impl Eq for DataTransferRequest {}

impl Hash for DataTransferRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for DataTransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.envelope, self.vendor_id)?;
        if let Some(message_id) = &self.message_id {
            write!(f, "/{}", message_id)?;
        }
        Ok(())
    }
}

impl ToJson for DataTransferRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .field("vendorId", &self.vendor_id)
            .optional("messageId", self.message_id.as_ref())
            .optional("data", self.data.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppRequest for DataTransferRequest {
    const ACTION: &'static str = "DataTransfer";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "data transfer request")?;

        let vendor_id = reader.mandatory::<VendorId>("vendorId", "vendor identification")?;
        let message_id = reader.optional_text("messageId", "message identification", MAX_MESSAGE_ID_LENGTH)?;
        let data = reader.optional::<Value>("data", "vendor data")?;

        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;

        options
            .parsers
            .apply(json, Self::build(envelope, vendor_id, message_id, data))
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct DataTransferResponse {
    envelope: ResponseEnvelope<DataTransferRequest>,
    status: DataTransferStatus,
    status_info: Option<StatusInfo>,
    data: Option<Value>,
}

impl DataTransferResponse {
    pub fn new(request: Arc<DataTransferRequest>, status: DataTransferStatus) -> Self {
        Self {
            envelope: ResponseEnvelope::ok(request),
            status,
            status_info: None,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_status_info(mut self, status_info: StatusInfo) -> Self {
        self.status_info = Some(status_info);
        self
    }

    pub fn status(&self) -> DataTransferStatus {
        self.status
    }

    pub fn status_info(&self) -> Option<&StatusInfo> {
        self.status_info.as_ref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl PartialEq for DataTransferResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.status == other.status
            && self.status_info == other.status_info
            && self.data == other.data
    }
}

impl Eq for DataTransferResponse {}

impl Hash for DataTransferResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
        self.status.hash(state);
        self.status_info.hash(state);
        hash_data(&self.data, state);
    }
}

impl fmt::Display for DataTransferResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.envelope, self.status)
    }
}

impl ToJson for DataTransferResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .enumeration("status", &self.status)
            .optional("statusInfo", self.status_info.as_ref())
            .optional("data", self.data.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppResponse for DataTransferResponse {
    type Request = DataTransferRequest;

    fn envelope(&self) -> &ResponseEnvelope<DataTransferRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<DataTransferRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "data transfer response")?;

        let status = reader.mandatory_enum("status", "data transfer status", "DataTransferStatus")?;
        let status_info = reader.optional::<StatusInfo>("statusInfo", "status info")?;
        let data = reader.optional::<Value>("data", "vendor data")?;

        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;

        options.parsers.apply(
            json,
            Self {
                envelope,
                status,
                status_info,
                data,
            },
        )
    }

    fn failed_with(request: Arc<DataTransferRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
            status: DataTransferStatus::default(),
            status_info: None,
            data: None,
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
    use crate::testing::{context, envelope, options, parse_request, response_context};
    use ocpp_core::json::hash_of;
    use serde_json::json;

    fn transfer_json() -> Value {
        json!({
            "vendorId": "com.elektrokombinacija",
            "messageId": "ModuleTelemetry",
            "data": { "modules": [{ "id": 1, "temp": 41.5 }], "ok": true }
        })
    }

    #[test]
    fn test_data_is_preserved() {
        let request = DataTransferRequest::try_parse(&transfer_json(), &context(), &options()).unwrap();

        assert_eq!(request.vendor_id().as_str(), "com.elektrokombinacija");
        assert_eq!(request.message_id(), Some("ModuleTelemetry"));
        assert_eq!(request.data().unwrap()["modules"][0]["temp"], json!(41.5));
        assert_eq!(request.to_json(), transfer_json());
    }

    #[test]
    fn test_data_participates_in_equality() {
        let a = DataTransferRequest::try_parse(&transfer_json(), &context(), &options()).unwrap();

        let mut json = transfer_json();
        json["data"]["ok"] = json!(false);
        let b = DataTransferRequest::try_parse(&json, &context(), &options()).unwrap();
        assert_ne!(a, b);

        let c = DataTransferRequest::with_message(
            envelope("DataTransfer"),
            VendorId::try_parse("com.elektrokombinacija").unwrap(),
            "ModuleTelemetry",
            transfer_json().get("data").cloned(),
        );
        assert_eq!(a, c);
        assert_eq!(hash_of(&a), hash_of(&c));
    }

    #[test]
    fn test_signed_zero_data_hashes_equally() {
        let positive = DataTransferRequest::try_parse(
            &json!({ "vendorId": "v", "data": { "x": 0.0 } }),
            &context(),
            &options(),
        )
        .unwrap();
        let negative = DataTransferRequest::try_parse(
            &json!({ "vendorId": "v", "data": { "x": -0.0 } }),
            &context(),
            &options(),
        )
        .unwrap();

        assert_eq!(positive, negative);
        assert_eq!(hash_of(&positive), hash_of(&negative));
    }

    #[test]
    fn test_blank_vendor_id() {
        let err = DataTransferRequest::try_parse(&json!({ "vendorId": "  " }), &context(), &options()).unwrap_err();
        assert!(matches!(&err, ParseError::InvalidField { key, .. } if key == "vendorId"));
    }

    #[test]
    fn test_message_id_length() {
        let json = json!({ "vendorId": "v", "messageId": "m".repeat(51) });
        let err = DataTransferRequest::try_parse(&json, &context(), &options()).unwrap_err();
        assert!(matches!(&err, ParseError::InvalidField { key, .. } if key == "messageId"));
    }

    #[test]
    fn test_response_round_trip() {
        let request = parse_request::<DataTransferRequest>(&transfer_json());
        let json = json!({ "status": "UnknownMessageId", "data": [1, 2, 3] });

        let response = DataTransferResponse::try_parse(request.clone(), &json, &response_context(), &options()).unwrap();
        assert_eq!(response.status(), DataTransferStatus::UnknownMessageId);
        assert_eq!(response.to_json(), json);

        let built = DataTransferResponse::new(request, DataTransferStatus::UnknownMessageId).with_data(json!([1, 2, 3]));
        assert_eq!(built, response);
        assert_eq!(hash_of(&built), hash_of(&response));
    }

    #[test]
    fn test_failed_response_rejects() {
        let request = parse_request::<DataTransferRequest>(&transfer_json());
        let failed = DataTransferResponse::failed(request);
        assert_eq!(failed.status(), DataTransferStatus::Rejected);
        assert!(failed.data().is_none());
        assert_eq!(failed.to_json(), json!({ "status": "Rejected" }));
    }
}
