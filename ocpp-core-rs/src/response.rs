//! Response envelope
//!
//! A response is generic over exactly one request type and keeps that request
//! alive through an `Arc`, so the correlation id always comes from the request
//! itself. Every response carries an [`OcppResult`], including the fault
//! responses produced by [`OcppResponse::failed`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::config::{ParseOptions, ParserConfig};
use crate::custom_data::CustomData;
use crate::error::{OcppError, ParseError, SignatureError};
use crate::ids::{NetworkPath, RequestId};
use crate::json::{JsonReader, JsonWriter, ToJson};
use crate::request::{parse_signatures, OcppRequest, CUSTOM_DATA_KEY};
use crate::result::OcppResult;
use crate::rpc::RpcError;
use crate::signature::{sign_json, verify_json, MessageSigner, SignInfo, Signature, SignatureVerifier, SIGNATURES_KEY};

/// Correlation data supplied by the transport alongside a response body
#[derive(Debug, Clone)]
pub struct ResponseContext {
    pub request_id: RequestId,
    pub network_path: NetworkPath,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ResponseContext {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            network_path: NetworkPath::empty(),
            timestamp: None,
        }
    }

    /// Context echoing the id of `request`
    pub fn for_request<R: OcppRequest>(request: &R) -> Self {
        Self::new(request.request_id().clone())
    }

    pub fn with_network_path(mut self, network_path: NetworkPath) -> Self {
        self.network_path = network_path;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Common part of every response
#[derive(Debug)]
pub struct ResponseEnvelope<Req> {
    request: Arc<Req>,
    result: OcppResult,
    timestamp: DateTime<Utc>,
    network_path: NetworkPath,
    sign_infos: Vec<SignInfo>,
    signatures: Vec<Signature>,
    custom_data: Option<CustomData>,
}

impl<Req> Clone for ResponseEnvelope<Req> {
    fn clone(&self) -> Self {
        Self {
            request: Arc::clone(&self.request),
            result: self.result.clone(),
            timestamp: self.timestamp,
            network_path: self.network_path.clone(),
            sign_infos: self.sign_infos.clone(),
            signatures: self.signatures.clone(),
            custom_data: self.custom_data.clone(),
        }
    }
}

impl<Req: OcppRequest> ResponseEnvelope<Req> {
    /// Envelope for a processed request with a known outcome
    pub fn new(request: Arc<Req>, result: OcppResult) -> Self {
        Self {
            request,
            result,
            timestamp: Utc::now(),
            network_path: NetworkPath::empty(),
            sign_infos: Vec::new(),
            signatures: Vec::new(),
            custom_data: None,
        }
    }

    pub fn ok(request: Arc<Req>) -> Self {
        Self::new(request, OcppResult::ok())
    }

    pub fn ok_at(request: Arc<Req>, timestamp: DateTime<Utc>) -> Self {
        Self::ok(request).with_timestamp(timestamp)
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_network_path(mut self, network_path: NetworkPath) -> Self {
        self.network_path = network_path;
        self
    }

    pub fn with_sign_infos(mut self, sign_infos: Vec<SignInfo>) -> Self {
        self.sign_infos = sign_infos;
        self
    }

    pub fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_custom_data(mut self, custom_data: CustomData) -> Self {
        self.custom_data = Some(custom_data);
        self
    }

    /// Parse the shared optional fields of a response body. Fails when the
    /// transport's request id does not belong to `request`.
    pub fn from_json(
        reader: &JsonReader<'_>,
        request: Arc<Req>,
        ctx: &ResponseContext,
        config: &ParserConfig,
    ) -> Result<Self, ParseError> {
        if &ctx.request_id != request.request_id() {
            return Err(ParseError::CorrelationMismatch {
                request: request.request_id().to_string(),
                response: ctx.request_id.to_string(),
            });
        }

        let signatures = parse_signatures(reader, config)?;
        let custom_data = reader.optional::<CustomData>(CUSTOM_DATA_KEY, "custom data")?;

        Ok(Self {
            request,
            result: OcppResult::ok(),
            timestamp: ctx.timestamp.unwrap_or_else(Utc::now),
            network_path: ctx.network_path.clone(),
            sign_infos: Vec::new(),
            signatures,
            custom_data,
        })
    }

    pub fn write_into<'a>(&self, writer: JsonWriter<'a>) -> JsonWriter<'a> {
        writer
            .non_empty_array(SIGNATURES_KEY, &self.signatures)
            .optional(CUSTOM_DATA_KEY, self.custom_data.as_ref())
    }

    /// Structural equality over the shared fields. Results compare by outcome
    /// only; failure codes and descriptions are diagnostics.
    pub fn generic_equals(&self, other: &ResponseEnvelope<Req>) -> bool {
        self.result.same_outcome(&other.result)
            && self.request_id() == other.request_id()
            && self.signatures == other.signatures
            && self.custom_data == other.custom_data
    }

    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.result.is_ok().hash(state);
        self.request_id().hash(state);
        self.signatures.hash(state);
        self.custom_data.hash(state);
    }

    pub fn request(&self) -> &Arc<Req> {
        &self.request
    }

    /// Always the id of the originating request
    pub fn request_id(&self) -> &RequestId {
        self.request.request_id()
    }

    pub fn result(&self) -> &OcppResult {
        &self.result
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Time between sending the request and receiving the response
    pub fn runtime(&self) -> chrono::Duration {
        self.timestamp - self.request.envelope().timestamp()
    }

    pub fn network_path(&self) -> &NetworkPath {
        &self.network_path
    }

    pub fn sign_infos(&self) -> &[SignInfo] {
        &self.sign_infos
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    pub fn custom_data(&self) -> Option<&CustomData> {
        self.custom_data.as_ref()
    }
}

impl<Req: OcppRequest> fmt::Display for ResponseEnvelope<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} response {} [{}]", Req::ACTION, self.request_id(), self.result)
    }
}

/// Contract implemented by every concrete response type
pub trait OcppResponse: ToJson + fmt::Debug + fmt::Display + Eq + Hash + Sized + 'static {
    type Request: OcppRequest;

    fn envelope(&self) -> &ResponseEnvelope<Self::Request>;

    /// Parse a response body received for `request`
    fn try_parse(
        request: Arc<Self::Request>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError>;

    /// Fault response with every payload field at its default
    fn failed_with(request: Arc<Self::Request>, result: OcppResult) -> Self;

    fn with_signatures(self, signatures: Vec<Signature>) -> Self;

    /// The canonical "could not produce the real response" value
    fn failed(request: Arc<Self::Request>) -> Self {
        let description = format!("{} request could not be processed", Self::Request::ACTION);
        Self::failed_with(request, OcppResult::server_error(description))
    }

    /// Fault response for an RPC error answer received from the peer
    fn from_rpc_error(request: Arc<Self::Request>, error: &RpcError) -> Self {
        Self::failed_with(request, OcppResult::from(error))
    }

    fn parse(
        request: Arc<Self::Request>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, OcppError> {
        Self::try_parse(request, json, ctx, options).map_err(|e| {
            debug!("Failed to parse {} response {}: {}", Self::Request::ACTION, ctx.request_id, e);
            OcppError::parse(Self::Request::ACTION, e)
        })
    }

    fn request(&self) -> &Arc<Self::Request> {
        self.envelope().request()
    }

    fn result(&self) -> &OcppResult {
        self.envelope().result()
    }

    fn sign(self, signer: &dyn MessageSigner) -> Result<Self, SignatureError> {
        let mut signatures = self.envelope().signatures().to_vec();
        signatures.extend(sign_json(&self.to_json(), self.envelope().sign_infos(), signer)?);
        Ok(self.with_signatures(signatures))
    }

    fn verify_signatures(&self, verifier: &dyn SignatureVerifier) -> Result<(), SignatureError> {
        verify_json(&self.to_json(), self.envelope().signatures(), verifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::hash_of;
    use crate::result::ResultCode;
    use crate::rpc::RpcErrorCode;
    use crate::signature::tests::LengthSigner;
    use crate::testing::{SampleRequest, SampleResponse};
    use serde_json::json;

    fn request() -> Arc<SampleRequest> {
        Arc::new(SampleRequest::sample())
    }

    #[test]
    fn test_response_keeps_request_instance() {
        let request = request();
        let response = SampleResponse::try_parse(
            Arc::clone(&request),
            &json!({ "echo": "hi" }),
            &ResponseContext::for_request(request.as_ref()),
            &ParseOptions::default(),
        )
        .unwrap();

        assert!(Arc::ptr_eq(response.request(), &request));
        assert_eq!(response.envelope().request_id(), request.request_id());
        assert!(response.result().is_ok());
        assert_eq!(response.echo.as_deref(), Some("hi"));
    }

    #[test]
    fn test_mismatching_request_id_is_rejected() {
        let ctx = ResponseContext::new(RequestId::try_parse("someone-else").unwrap());
        let err = SampleResponse::try_parse(request(), &json!({}), &ctx, &ParseOptions::default()).unwrap_err();

        assert!(matches!(err, ParseError::CorrelationMismatch { .. }));
    }

    #[test]
    fn test_failed_never_carries_payload() {
        let response = SampleResponse::failed(request());

        assert_eq!(response.result().code, ResultCode::ServerError);
        assert!(response.echo.is_none());
        assert_eq!(response.to_json(), json!({}));
    }

    #[test]
    fn test_failed_equals_every_rpc_fault() {
        let request = request();
        let failed = SampleResponse::failed(Arc::clone(&request));

        for code in RpcErrorCode::ALL {
            let fault = SampleResponse::from_rpc_error(Arc::clone(&request), &RpcError::new(code, "boom"));
            assert!(!fault.result().is_ok(), "{} reported success", code);
            assert_eq!(failed, fault, "{} differs from failed()", code);
            assert_eq!(hash_of(&failed), hash_of(&fault), "{} hashes differently", code);
        }

        assert_ne!(failed, SampleResponse::failed_with(request, OcppResult::ok()));
    }

    #[test]
    fn test_runtime_measures_from_request_timestamp() {
        let request = request();
        let sent = request.envelope().timestamp();
        let envelope = ResponseEnvelope::ok_at(Arc::clone(&request), sent + chrono::Duration::milliseconds(250));

        assert_eq!(envelope.runtime(), chrono::Duration::milliseconds(250));
    }

    #[test]
    fn test_parse_wrapper_names_action() {
        let request = request();
        let err = SampleResponse::parse(
            Arc::clone(&request),
            &json!("not an object"),
            &ResponseContext::for_request(request.as_ref()),
            &ParseOptions::default(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Sample"));
    }

    #[test]
    fn test_sign_response() {
        let request = request();
        let response = SampleResponse {
            envelope: ResponseEnvelope::ok(request).with_sign_infos(vec![SignInfo::new("csms-key")]),
            echo: Some("x".into()),
        };

        let signed = response.sign(&LengthSigner).unwrap();
        assert_eq!(signed.envelope().signatures().len(), 1);
        assert!(signed.verify_signatures(&LengthSigner).is_ok());
        assert_eq!(signed.to_json()["signatures"][0]["keyId"], json!("csms-key"));
    }
}
