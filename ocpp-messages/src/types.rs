//! OCPP 2.1 complex types and enumerations shared across messages
//!
//! Every complex type follows the same contract as a message: `FromJson`
//! reads mandatory fields before optional ones and applies the caller's
//! custom parser last, `ToJson` omits absent fields and applies the custom
//! serializer last.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use ocpp_core::json::hash_unordered;
use ocpp_core::{
    CustomData, CustomParsers, CustomSerializers, EvseId, FromJson, JsonReader, JsonWriter, ParseError, ToJson,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Enumerations
// ============================================================================

/// Result of an authorization check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    Accepted,
    Blocked,
    ConcurrentTx,
    Expired,
    Invalid,
    NoCredit,
    NotAllowedTypeEVSE,
    NotAtThisLocation,
    NotAtThisTime,
    #[default]
    Unknown,
}

/// Validity of the certificate sent with an Authorize request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizeCertificateStatus {
    Accepted,
    SignatureError,
    CertificateExpired,
    CertificateRevoked,
    NoCertificateAvailable,
    CertChainError,
    ContractCancelled,
}

/// Hash algorithm used for OCSP request data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA256")]
    Sha256,
    #[serde(rename = "SHA384")]
    Sha384,
    #[serde(rename = "SHA512")]
    Sha512,
}

/// Format of a message shown to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageFormat {
    #[serde(rename = "ASCII")]
    Ascii,
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "URI")]
    Uri,
    #[serde(rename = "UTF8")]
    Utf8,
    #[serde(rename = "QRCODE")]
    QrCode,
}

/// Boot reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootReason {
    ApplicationReset,
    FirmwareUpdate,
    LocalReset,
    PowerUp,
    RemoteReset,
    ScheduledReset,
    Triggered,
    Unknown,
    Watchdog,
}

/// Registration status for BootNotification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RegistrationStatus {
    Accepted,
    Pending,
    #[default]
    Rejected,
}

/// Outcome of ClearCache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClearCacheStatus {
    Accepted,
    #[default]
    Rejected,
}

/// Outcome of DataTransfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataTransferStatus {
    Accepted,
    #[default]
    Rejected,
    UnknownMessageId,
    UnknownVendorId,
}

/// Progress of a firmware update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FirmwareStatus {
    Downloaded,
    DownloadFailed,
    Downloading,
    DownloadScheduled,
    DownloadPaused,
    Idle,
    InstallationFailed,
    Installing,
    Installed,
    InstallRebooting,
    InstallScheduled,
    InstallVerificationFailed,
    InvalidSignature,
    SignatureVerified,
}

/// Kind of reset requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResetType {
    Immediate,
    OnIdle,
    ImmediateAndResume,
}

/// Outcome of Reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResetStatus {
    Accepted,
    #[default]
    Rejected,
    Scheduled,
}

/// Connector status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorStatus {
    Available,
    Occupied,
    Reserved,
    Unavailable,
    Faulted,
}

// ============================================================================
// Complex Types
// ============================================================================

/// Additional identification attached to an IdToken
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdditionalInfo {
    pub additional_id_token: String,
    pub info_type: String,
    pub custom_data: Option<CustomData>,
}

impl AdditionalInfo {
    pub fn new(additional_id_token: impl Into<String>, info_type: impl Into<String>) -> Self {
        Self {
            additional_id_token: additional_id_token.into(),
            info_type: info_type.into(),
            custom_data: None,
        }
    }
}

impl FromJson for AdditionalInfo {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "additional info")?;

        let additional_id_token = reader.mandatory_text("additionalIdToken", "additional id token", 255)?;
        let info_type = reader.mandatory_text("type", "additional info type", 50)?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(
            json,
            Self {
                additional_id_token,
                info_type,
                custom_data,
            },
        )
    }
}

impl ToJson for AdditionalInfo {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .field("additionalIdToken", &self.additional_id_token)
            .field("type", &self.info_type)
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Token for identification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdToken {
    pub id_token: String,
    pub token_type: String,
    pub additional_info: HashSet<AdditionalInfo>,
    pub custom_data: Option<CustomData>,
}

impl IdToken {
    pub fn new(id_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            id_token: id_token.into(),
            token_type: token_type.into(),
            additional_info: HashSet::new(),
            custom_data: None,
        }
    }

    pub fn with_additional_info(mut self, info: AdditionalInfo) -> Self {
        self.additional_info.insert(info);
        self
    }
}

impl Hash for IdToken {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id_token.hash(state);
        self.token_type.hash(state);
        hash_unordered(&self.additional_info, state);
        self.custom_data.hash(state);
    }
}

impl fmt::Display for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id_token, self.token_type)
    }
}

impl FromJson for IdToken {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "identification token")?;

        let id_token = reader.mandatory_text("idToken", "identification token value", 255)?;
        let token_type = reader.mandatory_text("type", "identification token type", 20)?;
        let additional_info = reader.optional_set::<AdditionalInfo>("additionalInfo", "additional info")?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(
            json,
            Self {
                id_token,
                token_type,
                additional_info,
                custom_data,
            },
        )
    }
}

impl ToJson for IdToken {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .field("idToken", &self.id_token)
            .field("type", &self.token_type)
            .non_empty_array("additionalInfo", &self.additional_info)
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Message content shown to the driver
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageContent {
    pub format: MessageFormat,
    pub language: Option<String>,
    pub content: String,
    pub custom_data: Option<CustomData>,
}

impl FromJson for MessageContent {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "message content")?;

        let format = reader.mandatory_enum("format", "message format", "MessageFormat")?;
        let content = reader.mandatory_text("content", "message content", 1024)?;
        let language = reader.optional_text("language", "message language", 8)?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(
            json,
            Self {
                format,
                language,
                content,
                custom_data,
            },
        )
    }
}

impl ToJson for MessageContent {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .enumeration("format", &self.format)
            .optional("language", self.language.as_ref())
            .field("content", &self.content)
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Authorization details returned for an IdToken
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IdTokenInfo {
    pub status: AuthorizationStatus,
    pub cache_expiry_date_time: Option<DateTime<Utc>>,
    pub charging_priority: Option<i32>,
    pub language1: Option<String>,
    pub evse_ids: Vec<EvseId>,
    pub group_id_token: Option<IdToken>,
    pub language2: Option<String>,
    pub personal_message: Option<MessageContent>,
    pub custom_data: Option<CustomData>,
}

impl IdTokenInfo {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

impl FromJson for IdTokenInfo {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "identification token info")?;

        let status = reader.mandatory_enum("status", "authorization status", "AuthorizationStatus")?;
        let cache_expiry_date_time =
            reader.optional::<DateTime<Utc>>("cacheExpiryDateTime", "cache expiry timestamp")?;
        let charging_priority = reader.optional_i32_in_range("chargingPriority", "charging priority", -9..=9)?;
        let language1 = reader.optional_text("language1", "preferred language", 8)?;
        let evse_ids = reader.optional_vec::<EvseId>("evseId", "EVSE ids")?;
        let group_id_token = reader.optional::<IdToken>("groupIdToken", "group identification token")?;
        let language2 = reader.optional_text("language2", "second preferred language", 8)?;
        let personal_message = reader.optional::<MessageContent>("personalMessage", "personal message")?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(
            json,
            Self {
                status,
                cache_expiry_date_time,
                charging_priority,
                language1,
                evse_ids,
                group_id_token,
                language2,
                personal_message,
                custom_data,
            },
        )
    }
}

impl ToJson for IdTokenInfo {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .enumeration("status", &self.status)
            .optional("cacheExpiryDateTime", self.cache_expiry_date_time.as_ref())
            .optional("chargingPriority", self.charging_priority.as_ref())
            .optional("language1", self.language1.as_ref())
            .non_empty_array("evseId", &self.evse_ids)
            .optional("groupIdToken", self.group_id_token.as_ref())
            .optional("language2", self.language2.as_ref())
            .optional("personalMessage", self.personal_message.as_ref())
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Extra detail on a status
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusInfo {
    pub reason_code: String,
    pub additional_info: Option<String>,
    pub custom_data: Option<CustomData>,
}

impl StatusInfo {
    pub fn new(reason_code: impl Into<String>) -> Self {
        Self {
            reason_code: reason_code.into(),
            additional_info: None,
            custom_data: None,
        }
    }

    pub fn with_additional_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }
}

impl fmt::Display for StatusInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.additional_info {
            Some(info) => write!(f, "{} ({})", self.reason_code, info),
            None => f.write_str(&self.reason_code),
        }
    }
}

impl FromJson for StatusInfo {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "status info")?;

        let reason_code = reader.mandatory_text("reasonCode", "reason code", 20)?;
        let additional_info = reader.optional_text("additionalInfo", "additional info", 1024)?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(
            json,
            Self {
                reason_code,
                additional_info,
                custom_data,
            },
        )
    }
}

impl ToJson for StatusInfo {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .field("reasonCode", &self.reason_code)
            .optional("additionalInfo", self.additional_info.as_ref())
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Data identifying a certificate for an OCSP check
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OcspRequestData {
    pub hash_algorithm: HashAlgorithm,
    pub issuer_name_hash: String,
    pub issuer_key_hash: String,
    pub serial_number: String,
    pub responder_url: String,
    pub custom_data: Option<CustomData>,
}

impl FromJson for OcspRequestData {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "OCSP request data")?;

        let hash_algorithm = reader.mandatory_enum("hashAlgorithm", "hash algorithm", "HashAlgorithm")?;
        let issuer_name_hash = reader.mandatory_text("issuerNameHash", "issuer name hash", 128)?;
        let issuer_key_hash = reader.mandatory_text("issuerKeyHash", "issuer key hash", 128)?;
        let serial_number = reader.mandatory_text("serialNumber", "certificate serial number", 40)?;
        let responder_url = reader.mandatory_text("responderURL", "OCSP responder URL", 2000)?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(
            json,
            Self {
                hash_algorithm,
                issuer_name_hash,
                issuer_key_hash,
                serial_number,
                responder_url,
                custom_data,
            },
        )
    }
}

impl ToJson for OcspRequestData {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .enumeration("hashAlgorithm", &self.hash_algorithm)
            .field("issuerNameHash", &self.issuer_name_hash)
            .field("issuerKeyHash", &self.issuer_key_hash)
            .field("serialNumber", &self.serial_number)
            .field("responderURL", &self.responder_url)
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Wireless module of a charging station
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Modem {
    pub iccid: Option<String>,
    pub imsi: Option<String>,
    pub custom_data: Option<CustomData>,
}

impl FromJson for Modem {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "modem")?;

        let iccid = reader.optional_text("iccid", "ICCID", 20)?;
        let imsi = reader.optional_text("imsi", "IMSI", 20)?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(json, Self { iccid, imsi, custom_data })
    }
}

impl ToJson for Modem {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .optional("iccid", self.iccid.as_ref())
            .optional("imsi", self.imsi.as_ref())
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

/// Charging station information
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChargingStation {
    pub model: String,
    pub vendor_name: String,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub modem: Option<Modem>,
    pub custom_data: Option<CustomData>,
}

impl ChargingStation {
    pub fn new(vendor_name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            vendor_name: vendor_name.into(),
            serial_number: None,
            firmware_version: None,
            modem: None,
            custom_data: None,
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_firmware(mut self, version: impl Into<String>) -> Self {
        self.firmware_version = Some(version.into());
        self
    }
}

impl fmt::Display for ChargingStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.vendor_name, self.model)?;
        if let Some(serial) = &self.serial_number {
            write!(f, " #{}", serial)?;
        }
        Ok(())
    }
}

impl FromJson for ChargingStation {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "charging station")?;

        let model = reader.mandatory_text("model", "model", 20)?;
        let vendor_name = reader.mandatory_text("vendorName", "vendor name", 50)?;
        let serial_number = reader.optional_text("serialNumber", "serial number", 25)?;
        let firmware_version = reader.optional_text("firmwareVersion", "firmware version", 50)?;
        let modem = reader.optional::<Modem>("modem", "modem")?;
        let custom_data = reader.optional::<CustomData>("customData", "custom data")?;

        parsers.apply(
            json,
            Self {
                model,
                vendor_name,
                serial_number,
                firmware_version,
                modem,
                custom_data,
            },
        )
    }
}

impl ToJson for ChargingStation {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = JsonWriter::new(serializers)
            .optional("serialNumber", self.serial_number.as_ref())
            .field("model", &self.model)
            .optional("modem", self.modem.as_ref())
            .field("vendorName", &self.vendor_name)
            .optional("firmwareVersion", self.firmware_version.as_ref())
            .optional("customData", self.custom_data.as_ref())
            .finish();

        serializers.apply(self, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse<T: FromJson>(json: &Value) -> Result<T, ParseError> {
        T::from_json(json, &CustomParsers::none())
    }

    #[test]
    fn test_id_token_additional_info_is_a_set() {
        let json = json!({
            "idToken": "04E1FA41B8D480",
            "type": "ISO14443",
            "additionalInfo": [
                { "additionalIdToken": "A", "type": "x" },
                { "additionalIdToken": "A", "type": "x" },
                { "additionalIdToken": "B", "type": "x" }
            ]
        });

        let token: IdToken = parse(&json).unwrap();
        assert_eq!(token.additional_info.len(), 2);
        assert_eq!(token.to_string(), "04E1FA41B8D480 (ISO14443)");

        let reparsed: IdToken = parse(&token.to_json()).unwrap();
        assert_eq!(reparsed, token);
    }

    #[test]
    fn test_id_token_type_length() {
        let json = json!({ "idToken": "X", "type": "a-type-name-that-is-too-long" });
        let err = parse::<IdToken>(&json).unwrap_err();
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_id_token_info_priority_range() {
        let json = json!({ "status": "Accepted", "chargingPriority": 10 });
        let err = parse::<IdTokenInfo>(&json).unwrap_err();
        assert!(err.to_string().contains("chargingPriority"));
    }

    #[test]
    fn test_id_token_info_full() {
        let json = json!({
            "status": "Accepted",
            "cacheExpiryDateTime": "2026-02-01T00:00:00Z",
            "chargingPriority": -2,
            "language1": "en",
            "evseId": [1, 2],
            "groupIdToken": { "idToken": "GROUP-1", "type": "Central" },
            "personalMessage": { "format": "UTF8", "content": "Welcome" }
        });

        let info: IdTokenInfo = parse(&json).unwrap();
        assert_eq!(info.status, AuthorizationStatus::Accepted);
        assert_eq!(info.evse_ids, vec![EvseId::new(1), EvseId::new(2)]);
        assert_eq!(info.personal_message.as_ref().unwrap().format, MessageFormat::Utf8);
        assert_eq!(info.to_json(), json);
    }

    #[test]
    fn test_unknown_enum_value() {
        let json = json!({ "status": "Maybe" });
        let err = parse::<IdTokenInfo>(&json).unwrap_err();
        assert!(matches!(err.root_cause(), ParseError::UnknownEnumValue { type_name: "AuthorizationStatus", .. }));
    }

    #[test]
    fn test_charging_station_with_modem() {
        let json = json!({
            "model": "EK3",
            "vendorName": "Elektrokombinacija",
            "serialNumber": "EK3-001",
            "modem": { "iccid": "8931440400012345678" }
        });

        let station: ChargingStation = parse(&json).unwrap();
        assert_eq!(station.modem.as_ref().unwrap().iccid.as_deref(), Some("8931440400012345678"));
        assert_eq!(station.to_string(), "Elektrokombinacija EK3 #EK3-001");
        assert_eq!(station.to_json(), json);
    }

    #[test]
    fn test_nested_custom_serializer() {
        let serializers = CustomSerializers::none().register::<StatusInfo, _>(|info, mut json| {
            json["reasonCode"] = json!(info.reason_code.to_lowercase());
            json
        });

        let info = StatusInfo::new("NoCable").with_additional_info("unplugged");
        assert_eq!(
            info.to_json_with(&serializers),
            json!({ "reasonCode": "nocable", "additionalInfo": "unplugged" })
        );
    }

    #[test]
    fn test_ocsp_request_data() {
        let json = json!({
            "hashAlgorithm": "SHA256",
            "issuerNameHash": "aa",
            "issuerKeyHash": "bb",
            "serialNumber": "01",
            "responderURL": "http://ocsp.example.com"
        });

        let data: OcspRequestData = parse(&json).unwrap();
        assert_eq!(data.hash_algorithm, HashAlgorithm::Sha256);
        assert_eq!(data.to_json(), json);

        let mut missing = json.clone();
        missing.as_object_mut().unwrap().remove("responderURL");
        assert_eq!(
            parse::<OcspRequestData>(&missing).unwrap_err(),
            ParseError::missing("responderURL", "OCSP responder URL")
        );
    }
}
