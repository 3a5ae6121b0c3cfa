//! Authorize
//!
//! Sent by a charging station to ask whether an identification token may start
//! or stop a charging session. ISO 15118 stations may attach a contract
//! certificate or OCSP data for the CSMS to validate.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ocpp_core::json::hash_unordered;
use ocpp_core::{
    ConstructionError, CustomSerializers, JsonReader, JsonWriter, OcppRequest, OcppResponse, OcppResult,
    ParseError, ParseOptions, RequestContext, RequestEnvelope, ResponseContext, ResponseEnvelope, Signature,
    ToJson,
};
use serde_json::Value;

use crate::types::{AuthorizeCertificateStatus, IdToken, IdTokenInfo, OcspRequestData};

/// Upper bound on `iso15118CertificateHashData` entries
pub const MAX_CERTIFICATE_HASH_DATA: usize = 4;

/// Upper bound on the PEM certificate chain length
pub const MAX_CERTIFICATE_LENGTH: usize = 10_000;

const HASH_DATA_KEY: &str = "iso15118CertificateHashData";

#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    envelope: RequestEnvelope,
    id_token: IdToken,
    certificate: Option<String>,
    iso15118_certificate_hash_data: HashSet<OcspRequestData>,
    hash_code: u64,
}

impl AuthorizeRequest {
    pub fn new(envelope: RequestEnvelope, id_token: IdToken) -> Self {
        Self::build(envelope, id_token, None, HashSet::new())
    }

    /// Request with a certificate and/or OCSP data attached
    pub fn try_new(
        envelope: RequestEnvelope,
        id_token: IdToken,
        certificate: Option<String>,
        iso15118_certificate_hash_data: HashSet<OcspRequestData>,
    ) -> Result<Self, ConstructionError> {
        if iso15118_certificate_hash_data.len() > MAX_CERTIFICATE_HASH_DATA {
            return Err(ConstructionError::TooManyElements {
                field: HASH_DATA_KEY,
                max: MAX_CERTIFICATE_HASH_DATA,
                len: iso15118_certificate_hash_data.len(),
            });
        }
        if let Some(certificate) = &certificate {
            let len = certificate.chars().count();
            if len > MAX_CERTIFICATE_LENGTH {
                return Err(ConstructionError::InvalidArgument {
                    field: "certificate",
                    reason: format!("{} characters exceed the maximum of {}", len, MAX_CERTIFICATE_LENGTH),
                });
            }
        }

        Ok(Self::build(envelope, id_token, certificate, iso15118_certificate_hash_data))
    }

    fn build(
        envelope: RequestEnvelope,
        id_token: IdToken,
        certificate: Option<String>,
        iso15118_certificate_hash_data: HashSet<OcspRequestData>,
    ) -> Self {
        let mut request = Self {
            envelope,
            id_token,
            certificate,
            iso15118_certificate_hash_data,
            hash_code: 0,
        };
        request.hash_code = request.compute_hash();
        request
    }

    fn compute_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.envelope.hash_into(&mut hasher);
        self.id_token.hash(&mut hasher);
        self.certificate.hash(&mut hasher);
        hash_unordered(&self.iso15118_certificate_hash_data, &mut hasher);
        hasher.finish()
    }

    pub fn id_token(&self) -> &IdToken {
        &self.id_token
    }

    pub fn certificate(&self) -> Option<&str> {
        self.certificate.as_deref()
    }

    pub fn iso15118_certificate_hash_data(&self) -> &HashSet<OcspRequestData> {
        &self.iso15118_certificate_hash_data
    }
}

impl PartialEq for AuthorizeRequest {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.id_token == other.id_token
            && self.certificate == other.certificate
            && self.iso15118_certificate_hash_data == other.iso15118_certificate_hash_data
    }
}

impl Eq for AuthorizeRequest {}

impl Hash for AuthorizeRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_code);
    }
}

impl fmt::Display for AuthorizeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.envelope, self.id_token)?;
        if self.certificate.is_some() {
            f.write_str(" +certificate")?;
        }
        Ok(())
    }
}

impl ToJson for AuthorizeRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .field("idToken", &self.id_token)
            .optional("certificate", self.certificate.as_ref())
            .non_empty_array(HASH_DATA_KEY, &self.iso15118_certificate_hash_data);
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppRequest for AuthorizeRequest {
    const ACTION: &'static str = "Authorize";

    fn envelope(&self) -> &RequestEnvelope {
        &self.envelope
    }

    fn try_parse(json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "authorize request")?;

        let id_token = reader.mandatory::<IdToken>("idToken", "identification token")?;
        let certificate = reader.optional_text("certificate", "certificate chain", MAX_CERTIFICATE_LENGTH)?;
        let hash_data = reader.optional_vec::<OcspRequestData>(HASH_DATA_KEY, "ISO 15118 certificate hash data")?;
        if hash_data.len() > MAX_CERTIFICATE_HASH_DATA {
            return Err(ParseError::TooManyElements {
                key: HASH_DATA_KEY.to_string(),
                name: "ISO 15118 certificate hash data".to_string(),
                max: MAX_CERTIFICATE_HASH_DATA,
                len: hash_data.len(),
            });
        }

        let envelope = RequestEnvelope::from_json(&reader, Self::ACTION, ctx, &options.config)?;

        options.parsers.apply(
            json,
            Self::build(envelope, id_token, certificate, hash_data.into_iter().collect()),
        )
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self.hash_code = self.compute_hash();
        self
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizeResponse {
    envelope: ResponseEnvelope<AuthorizeRequest>,
    id_token_info: IdTokenInfo,
    certificate_status: Option<AuthorizeCertificateStatus>,
}

impl AuthorizeResponse {
    pub fn new(request: Arc<AuthorizeRequest>, id_token_info: IdTokenInfo) -> Self {
        Self {
            envelope: ResponseEnvelope::ok(request),
            id_token_info,
            certificate_status: None,
        }
    }

    pub fn with_certificate_status(mut self, status: AuthorizeCertificateStatus) -> Self {
        self.certificate_status = Some(status);
        self
    }

    pub fn id_token_info(&self) -> &IdTokenInfo {
        &self.id_token_info
    }

    pub fn certificate_status(&self) -> Option<AuthorizeCertificateStatus> {
        self.certificate_status
    }
}

impl PartialEq for AuthorizeResponse {
    fn eq(&self, other: &Self) -> bool {
        self.envelope.generic_equals(&other.envelope)
            && self.id_token_info == other.id_token_info
            && self.certificate_status == other.certificate_status
    }
}

impl Eq for AuthorizeResponse {}

impl Hash for AuthorizeResponse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.envelope.hash_into(state);
        self.id_token_info.hash(state);
        self.certificate_status.hash(state);
    }
}

impl fmt::Display for AuthorizeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}", self.envelope, self.id_token_info.status)
    }
}

impl ToJson for AuthorizeResponse {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let writer = JsonWriter::new(serializers)
            .field("idTokenInfo", &self.id_token_info)
            .optional_enumeration("certificateStatus", self.certificate_status.as_ref());
        let json = self.envelope.write_into(writer).finish();

        serializers.apply(self, json)
    }
}

impl OcppResponse for AuthorizeResponse {
    type Request = AuthorizeRequest;

    fn envelope(&self) -> &ResponseEnvelope<AuthorizeRequest> {
        &self.envelope
    }

    fn try_parse(
        request: Arc<AuthorizeRequest>,
        json: &Value,
        ctx: &ResponseContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, &options.parsers, "authorize response")?;

        let id_token_info = reader.mandatory::<IdTokenInfo>("idTokenInfo", "identification token info")?;
        let certificate_status =
            reader.optional_enum("certificateStatus", "certificate status", "AuthorizeCertificateStatus")?;

        let envelope = ResponseEnvelope::from_json(&reader, request, ctx, &options.config)?;

        options.parsers.apply(
            json,
            Self {
                envelope,
                id_token_info,
                certificate_status,
            },
        )
    }

    fn failed_with(request: Arc<AuthorizeRequest>, result: OcppResult) -> Self {
        Self {
            envelope: ResponseEnvelope::new(request, result),
            id_token_info: IdTokenInfo::default(),
            certificate_status: None,
        }
    }

    fn with_signatures(mut self, signatures: Vec<Signature>) -> Self {
        self.envelope = self.envelope.with_signatures(signatures);
        self
    }
}
