//! Cryptographic signatures attached to OCPP messages
//!
//! This layer only records signatures and computes the canonical payload they
//! cover. Producing and checking them is delegated to [`MessageSigner`] and
//! [`SignatureVerifier`] implementations supplied by the caller.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::custom::{CustomParsers, CustomSerializers};
use crate::error::{ParseError, SignatureError};
use crate::json::{FromJson, JsonReader, JsonWriter, ToJson};

/// Key under which every message carries its signatures
pub const SIGNATURES_KEY: &str = "signatures";

/// One signature over a message's canonical payload
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub key_id: String,
    pub value: String,
    pub signing_method: Option<String>,
    pub encoding_method: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Signature {
    pub fn new(key_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            value: value.into(),
            signing_method: None,
            encoding_method: None,
            name: None,
            description: None,
            timestamp: None,
        }
    }

    pub fn with_methods(mut self, signing_method: impl Into<String>, encoding_method: impl Into<String>) -> Self {
        self.signing_method = Some(signing_method.into());
        self.encoding_method = Some(encoding_method.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.signing_method {
            Some(method) => write!(f, "{} ({})", self.key_id, method),
            None => f.write_str(&self.key_id),
        }
    }
}

impl FromJson for Signature {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "signature")?;

        let key_id = reader.mandatory::<String>("keyId", "signature key id")?;
        let value = reader.mandatory::<String>("value", "signature value")?;
        let signing_method = reader.optional::<String>("signingMethod", "signing method")?;
        let encoding_method = reader.optional::<String>("encodingMethod", "encoding method")?;
        let name = reader.optional::<String>("name", "signer name")?;
        let description = reader.optional::<String>("description", "signature description")?;
        let timestamp = reader.optional::<DateTime<Utc>>("timestamp", "signature timestamp")?;

        parsers.apply(
            json,
            Self {
                key_id,
                value,
                signing_method,
                encoding_method,
                name,
                description,
                timestamp,
            },
        )
    }
}

impl ToJson for Signature {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .field("keyId", &self.key_id)
            .field("value", &self.value)
            .optional("signingMethod", self.signing_method.as_ref())
            .optional("encodingMethod", self.encoding_method.as_ref())
            .optional("name", self.name.as_ref())
            .optional("description", self.description.as_ref())
            .optional("timestamp", self.timestamp.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Instructions for the signer: which key and methods to use. Never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignInfo {
    pub key_id: String,
    pub signing_method: Option<String>,
    pub encoding_method: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SignInfo {
    pub fn new(key_id: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            signing_method: None,
            encoding_method: None,
            name: None,
            description: None,
        }
    }

    pub fn with_methods(mut self, signing_method: impl Into<String>, encoding_method: impl Into<String>) -> Self {
        self.signing_method = Some(signing_method.into());
        self.encoding_method = Some(encoding_method.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Produces signatures; implemented outside this crate
pub trait MessageSigner {
    fn sign(&self, info: &SignInfo, payload: &[u8]) -> Result<Signature, SignatureError>;
}

/// Checks signatures; implemented outside this crate
pub trait SignatureVerifier {
    fn verify(&self, signature: &Signature, payload: &[u8]) -> Result<bool, SignatureError>;
}

/// Bytes covered by a message's signatures: its JSON without the `signatures`
/// key, compact, keys sorted
pub fn canonical_payload(json: &Value) -> Vec<u8> {
    let mut json = json.clone();
    if let Value::Object(object) = &mut json {
        object.remove(SIGNATURES_KEY);
    }
    json.to_string().into_bytes()
}

/// One signature per sign info, over the canonical payload of `json`
pub fn sign_json(
    json: &Value,
    infos: &[SignInfo],
    signer: &dyn MessageSigner,
) -> Result<Vec<Signature>, SignatureError> {
    let payload = canonical_payload(json);
    infos.iter().map(|info| signer.sign(info, &payload)).collect()
}

/// Verify every signature against the canonical payload of `json`
pub fn verify_json(
    json: &Value,
    signatures: &[Signature],
    verifier: &dyn SignatureVerifier,
) -> Result<(), SignatureError> {
    if signatures.is_empty() {
        return Err(SignatureError::Unsigned);
    }

    let payload = canonical_payload(json);
    for signature in signatures {
        if !verifier.verify(signature, &payload)? {
            return Err(SignatureError::VerificationFailed {
                key_id: signature.key_id.clone(),
            });
        }
    }
    Ok(())
}
