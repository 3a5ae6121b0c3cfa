//! Request envelope
//!
//! Fields and behaviour shared by every OCPP request. Concrete requests embed a
//! [`RequestEnvelope`] and implement [`OcppRequest`]; their equality and hash
//! are the envelope's `generic_equals`/`hash_into` ANDed with their own fields.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::config::{ParseOptions, ParserConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::custom_data::CustomData;
use crate::error::{OcppError, ParseError, SignatureError};
use crate::ids::{EventTrackingId, NetworkPath, NetworkingNodeId, RequestId};
use crate::json::{JsonReader, JsonWriter, ToJson};
use crate::signature::{sign_json, verify_json, MessageSigner, SignInfo, Signature, SignatureVerifier, SIGNATURES_KEY};

/// In-body override of the transport-supplied sender
pub const SENDER_OVERRIDE_KEY: &str = "chargingStationId";

/// Key of the vendor extension object
pub const CUSTOM_DATA_KEY: &str = "customData";

/// Correlation data supplied by the transport alongside a request body
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: RequestId,
    pub origin: NetworkingNodeId,
    pub network_path: NetworkPath,
    pub timestamp: Option<DateTime<Utc>>,
    pub timeout: Option<Duration>,
    pub event_tracking_id: Option<EventTrackingId>,
}

impl RequestContext {
    pub fn new(request_id: RequestId, origin: NetworkingNodeId) -> Self {
        Self {
            request_id,
            origin,
            network_path: NetworkPath::empty(),
            timestamp: None,
            timeout: None,
            event_tracking_id: None,
        }
    }

    pub fn with_network_path(mut self, network_path: NetworkPath) -> Self {
        self.network_path = network_path;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_event_tracking_id(mut self, event_tracking_id: EventTrackingId) -> Self {
        self.event_tracking_id = Some(event_tracking_id);
        self
    }
}

/// Common part of every request
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    request_id: RequestId,
    action: &'static str,
    origin: NetworkingNodeId,
    network_path: NetworkPath,
    timestamp: DateTime<Utc>,
    timeout: Duration,
    event_tracking_id: EventTrackingId,
    sign_infos: Vec<SignInfo>,
    signatures: Vec<Signature>,
    custom_data: Option<CustomData>,
}

impl RequestEnvelope {
    /// New envelope with a random request id, the current time, the default
    /// timeout and a random event tracking id
    pub fn new(origin: NetworkingNodeId, action: &'static str) -> Self {
        Self {
            request_id: RequestId::new_random(),
            action,
            origin,
            network_path: NetworkPath::empty(),
            timestamp: Utc::now(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            event_tracking_id: EventTrackingId::new_random(),
            sign_infos: Vec::new(),
            signatures: Vec::new(),
            custom_data: None,
        }
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_network_path(mut self, network_path: NetworkPath) -> Self {
        self.network_path = network_path;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_tracking_id(mut self, event_tracking_id: EventTrackingId) -> Self {
        self.event_tracking_id = event_tracking_id;
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

    /// Parse the shared optional fields of a request body and merge them with
    /// the transport correlation data. Call after the message's own fields.
    pub fn from_json(
        reader: &JsonReader<'_>,
        action: &'static str,
        ctx: &RequestContext,
        config: &ParserConfig,
    ) -> Result<Self, ParseError> {
        let signatures = parse_signatures(reader, config)?;
        let custom_data = reader.optional::<CustomData>(CUSTOM_DATA_KEY, "custom data")?;

        let mut origin = ctx.origin.clone();
        if config.allow_sender_override {
            if let Some(sender) =
                reader.optional::<NetworkingNodeId>(SENDER_OVERRIDE_KEY, "charging station identification")?
            {
                if sender != origin {
                    debug!("{} request {}: sender '{}' overrides transport origin '{}'",
                        action, ctx.request_id, sender, origin);
                }
                origin = sender;
            }
        }

        Ok(Self {
            request_id: ctx.request_id.clone(),
            action,
            origin,
            network_path: ctx.network_path.clone(),
            timestamp: ctx.timestamp.unwrap_or_else(Utc::now),
            timeout: ctx.timeout.unwrap_or(config.default_request_timeout),
            event_tracking_id: ctx
                .event_tracking_id
                .clone()
                .unwrap_or_else(EventTrackingId::new_random),
            sign_infos: Vec::new(),
            signatures,
            custom_data,
        })
    }

    /// Append the shared fields to a message's JSON
    pub fn write_into<'a>(&self, writer: JsonWriter<'a>) -> JsonWriter<'a> {
        writer
            .non_empty_array(SIGNATURES_KEY, &self.signatures)
            .optional(CUSTOM_DATA_KEY, self.custom_data.as_ref())
    }

    /// Structural equality over the fields every request shares
    pub fn generic_equals(&self, other: &RequestEnvelope) -> bool {
        self.request_id == other.request_id
            && self.action == other.action
            && self.origin == other.origin
            && self.signatures == other.signatures
            && self.custom_data == other.custom_data
    }

    /// Hash contribution matching `generic_equals`
    pub fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.request_id.hash(state);
        self.action.hash(state);
        self.origin.hash(state);
        self.signatures.hash(state);
        self.custom_data.hash(state);
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    pub fn action(&self) -> &'static str {
        self.action
    }

    pub fn origin(&self) -> &NetworkingNodeId {
        &self.origin
    }

    pub fn network_path(&self) -> &NetworkPath {
        &self.network_path
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn event_tracking_id(&self) -> &EventTrackingId {
        &self.event_tracking_id
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

impl fmt::Display for RequestEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} from {}", self.action, self.request_id, self.origin)
    }
}

pub(crate) fn parse_signatures(reader: &JsonReader<'_>, config: &ParserConfig) -> Result<Vec<Signature>, ParseError> {
    let signatures = reader.optional_vec::<Signature>(SIGNATURES_KEY, "cryptographic signatures")?;
    if signatures.len() > config.max_signatures {
        return Err(ParseError::TooManyElements {
            key: SIGNATURES_KEY.to_string(),
            name: "cryptographic signatures".to_string(),
            max: config.max_signatures,
            len: signatures.len(),
        });
    }
    Ok(signatures)
}

/// Contract implemented by every concrete request type
pub trait OcppRequest: ToJson + fmt::Debug + fmt::Display + Eq + Hash + Sized + 'static {
    /// OCPP action name, constant per type
    const ACTION: &'static str;

    fn envelope(&self) -> &RequestEnvelope;

    /// Parse a request body. Mandatory fields are read before optional ones, the
    /// first failure wins, and a registered custom parser for `Self` runs last.
    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError>;

    /// Same request with its signature list replaced
    fn with_signatures(self, signatures: Vec<Signature>) -> Self;

    /// `try_parse` for callers that want an `OcppError` naming the action
    fn parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, OcppError> {
        Self::try_parse(json, ctx, options).map_err(|e| {
            debug!("Failed to parse {} request {}: {}", Self::ACTION, ctx.request_id, e);
            OcppError::parse(Self::ACTION, e)
        })
    }

    fn request_id(&self) -> &RequestId {
        self.envelope().request_id()
    }

    /// Sign with every `SignInfo` on the envelope; existing signatures are kept
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
mod trait_tests {
    use super::*;
    use crate::custom::{CustomParsers, CustomSerializers};
    use crate::signature::tests::LengthSigner;
    use crate::testing::SampleRequest;
    use serde_json::json;

    fn context() -> RequestContext {
        RequestContext::new(
            RequestId::try_parse("sample-1").unwrap(),
            NetworkingNodeId::try_parse("CS001").unwrap(),
        )
    }

    #[test]
    fn test_round_trip() {
        let request = SampleRequest::sample();
        let parsed = SampleRequest::try_parse(&request.to_json(), &context(), &ParseOptions::default()).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn test_custom_parser_runs_last_and_may_replace() {
        let parsers = CustomParsers::none().register::<SampleRequest, _>(|json, parsed| {
            let shout = json["label"].as_str().unwrap_or_default().to_uppercase();
            Ok(SampleRequest::new(parsed.envelope.clone(), shout))
        });
        let options = ParseOptions::default().with_parsers(parsers);

        let parsed = SampleRequest::try_parse(&json!({ "label": "quiet" }), &context(), &options).unwrap();
        assert_eq!(parsed.label, "QUIET");
    }

    #[test]
    fn test_custom_serializer_applied_last() {
        let serializers = CustomSerializers::none().register::<SampleRequest, _>(|request, mut json| {
            json["length"] = json!(request.label.len());
            json
        });

        let json = SampleRequest::sample().to_json_with(&serializers);
        assert_eq!(json, json!({ "label": "hello", "length": 5 }));
    }

    #[test]
    fn test_parse_reports_action() {
        let err = SampleRequest::parse(&json!({}), &context(), &ParseOptions::default()).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Sample"));
        assert!(text.contains("label"));
    }

    #[test]
    fn test_sign_and_verify_request() {
        let envelope = SampleRequest::sample()
            .envelope
            .with_sign_infos(vec![SignInfo::new("cs-key").with_methods("secp256r1", "base64")]);
        let request = SampleRequest::new(envelope, "hello");

        assert_eq!(request.verify_signatures(&LengthSigner), Err(SignatureError::Unsigned));

        let signed = request.clone().sign(&LengthSigner).unwrap();
        assert_eq!(signed.envelope().signatures().len(), 1);
        assert!(signed.verify_signatures(&LengthSigner).is_ok());
        assert_ne!(signed, request);

        let parsed = SampleRequest::try_parse(&signed.to_json(), &context(), &ParseOptions::default()).unwrap();
        assert_eq!(parsed, signed);
        assert!(parsed.verify_signatures(&LengthSigner).is_ok());
    }
}
