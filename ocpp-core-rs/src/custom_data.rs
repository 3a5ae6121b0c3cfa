//! Vendor-specific `customData` extension object

use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::custom::{CustomParsers, CustomSerializers};
use crate::error::ParseError;
use crate::ids::VendorId;
use crate::json::{hash_json, FromJson, JsonObject, JsonReader, JsonWriter, ToJson};

/// `customData`: a mandatory vendor id plus any vendor-defined properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomData {
    vendor_id: VendorId,
    properties: JsonObject,
}

impl CustomData {
    pub fn new(vendor_id: VendorId) -> Self {
        Self {
            vendor_id,
            properties: JsonObject::new(),
        }
    }

    /// Add a vendor property; `vendorId` itself cannot be overwritten
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        let key = key.into();
        if key != "vendorId" {
            self.properties.insert(key, value);
        }
        self
    }

    pub fn vendor_id(&self) -> &VendorId {
        &self.vendor_id
    }

    pub fn properties(&self) -> &JsonObject {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

impl Hash for CustomData {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vendor_id.hash(state);
        hash_json(&Value::Object(self.properties.clone()), state);
    }
}

impl fmt::Display for CustomData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} properties)", self.vendor_id, self.properties.len())
    }
}

impl FromJson for CustomData {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let reader = JsonReader::new(json, parsers, "custom data")?;
        let vendor_id = reader.mandatory::<VendorId>("vendorId", "vendor identification")?;

        let properties = reader
            .object()
            .iter()
            .filter(|(key, _)| key.as_str() != "vendorId")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        parsers.apply(json, Self { vendor_id, properties })
    }
}

impl ToJson for CustomData {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        let json = self
            .properties
            .iter()
            .fold(JsonWriter::new(serializers), |writer, (key, value)| {
                writer.raw(key, value.clone())
            })
            .field("vendorId", &self.vendor_id)
            .finish();

        serializers.apply(self, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_custom_data_keeps_vendor_properties() {
        let json = json!({ "vendorId": "com.example", "tariff": { "price": 42 } });
        let data = CustomData::from_json(&json, &CustomParsers::none()).unwrap();

        assert_eq!(data.vendor_id().as_str(), "com.example");
        assert_eq!(data.property("tariff"), Some(&json!({ "price": 42 })));
        assert_eq!(data.to_json(), json);
    }

    #[test]
    fn test_custom_data_requires_vendor_id() {
        let err = CustomData::from_json(&json!({ "tariff": 1 }), &CustomParsers::none()).unwrap_err();
        assert_eq!(err, ParseError::missing("vendorId", "vendor identification"));
    }

    #[test]
    fn test_builder_cannot_shadow_vendor_id() {
        let data = CustomData::new(VendorId::try_parse("com.example").unwrap())
            .with_property("vendorId", json!("other"))
            .with_property("mode", json!("eco"));

        assert_eq!(data.to_json(), json!({ "vendorId": "com.example", "mode": "eco" }));
    }
}
