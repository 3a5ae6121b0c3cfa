//! Fixtures shared by the message unit tests

use std::sync::Arc;

use ocpp_core::{
    NetworkingNodeId, OcppRequest, ParseOptions, RequestContext, RequestEnvelope, RequestId, ResponseContext,
};

pub const REQUEST_ID: &str = "req-1";
pub const ORIGIN: &str = "CS001";

pub fn node(id: &str) -> NetworkingNodeId {
    NetworkingNodeId::try_parse(id).unwrap()
}

pub fn request_id() -> RequestId {
    RequestId::try_parse(REQUEST_ID).unwrap()
}

pub fn context() -> RequestContext {
    RequestContext::new(request_id(), node(ORIGIN))
}

pub fn response_context() -> ResponseContext {
    ResponseContext::new(request_id())
}

pub fn options() -> ParseOptions {
    ParseOptions::default()
}

pub fn envelope(action: &'static str) -> RequestEnvelope {
    RequestEnvelope::new(node(ORIGIN), action).with_request_id(request_id())
}

pub fn parse_request<R: OcppRequest>(json: &serde_json::Value) -> Arc<R> {
    Arc::new(R::try_parse(json, &context(), &options()).unwrap())
}

/// Signs by summing the payload bytes; enough to detect tampering in tests
pub struct ChecksumSigner;

impl ocpp_core::MessageSigner for ChecksumSigner {
    fn sign(
        &self,
        info: &ocpp_core::SignInfo,
        payload: &[u8],
    ) -> Result<ocpp_core::Signature, ocpp_core::SignatureError> {
        let sum: u64 = payload.iter().map(|b| u64::from(*b)).sum();
        Ok(ocpp_core::Signature::new(info.key_id.clone(), format!("{:016x}", sum)))
    }
}

impl ocpp_core::SignatureVerifier for ChecksumSigner {
    fn verify(&self, signature: &ocpp_core::Signature, payload: &[u8]) -> Result<bool, ocpp_core::SignatureError> {
        let sum: u64 = payload.iter().map(|b| u64::from(*b)).sum();
        Ok(signature.value == format!("{:016x}", sum))
    }
}
