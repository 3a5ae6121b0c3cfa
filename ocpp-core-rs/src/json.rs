//! JSON field-parsing and serialization discipline
//!
//! Every OCPP value type implements [`FromJson`] and [`ToJson`]. Message
//! parsers pull fields through a [`JsonReader`], which names the offending field
//! in every error, and build output through a [`JsonWriter`], which only emits
//! fields that are actually present.
//!
//! Optional helpers are three-state: `Ok(None)` when the key is absent (or
//! `null`), `Ok(Some(_))` when present and valid, `Err(_)` when present but
//! malformed.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::custom::{CustomParsers, CustomSerializers};
use crate::error::ParseError;

pub type JsonObject = Map<String, Value>;

/// Types that can be parsed from their OCPP JSON representation
pub trait FromJson: Sized {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError>;
}

/// Types that can be rendered to their OCPP JSON representation
pub trait ToJson {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value;

    fn to_json(&self) -> Value {
        self.to_json_with(&CustomSerializers::none())
    }
}

// ============================================================================
// Primitive implementations
// ============================================================================

impl FromJson for String {
    fn from_json(json: &Value, _: &CustomParsers) -> Result<Self, ParseError> {
        json.as_str()
            .map(str::to_string)
            .ok_or_else(|| ParseError::unexpected_type("string", json))
    }
}

impl ToJson for String {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::String(self.clone())
    }
}

impl FromJson for bool {
    fn from_json(json: &Value, _: &CustomParsers) -> Result<Self, ParseError> {
        json.as_bool()
            .ok_or_else(|| ParseError::unexpected_type("boolean", json))
    }
}

impl ToJson for bool {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::Bool(*self)
    }
}

impl FromJson for i64 {
    fn from_json(json: &Value, _: &CustomParsers) -> Result<Self, ParseError> {
        json.as_i64()
            .ok_or_else(|| ParseError::unexpected_type("integer", json))
    }
}

impl ToJson for i64 {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::from(*self)
    }
}

impl FromJson for i32 {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let value = i64::from_json(json, parsers)?;
        i32::try_from(value)
            .map_err(|_| ParseError::InvalidValue(format!("{} does not fit a 32-bit integer", value)))
    }
}

impl ToJson for i32 {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::from(*self)
    }
}

impl FromJson for u32 {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let value = i64::from_json(json, parsers)?;
        u32::try_from(value)
            .map_err(|_| ParseError::InvalidValue(format!("{} is not a non-negative 32-bit integer", value)))
    }
}

impl ToJson for u32 {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::from(*self)
    }
}

impl FromJson for DateTime<Utc> {
    fn from_json(json: &Value, parsers: &CustomParsers) -> Result<Self, ParseError> {
        let text = String::from_json(json, parsers)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|timestamp| timestamp.with_timezone(&Utc))
            .map_err(|e| ParseError::InvalidValue(format!("'{}' is not an RFC 3339 timestamp: {}", text, e)))
    }
}

impl ToJson for DateTime<Utc> {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        Value::String(self.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl FromJson for Value {
    fn from_json(json: &Value, _: &CustomParsers) -> Result<Self, ParseError> {
        Ok(json.clone())
    }
}

impl ToJson for Value {
    fn to_json_with(&self, _: &CustomSerializers) -> Value {
        self.clone()
    }
}

/// Parse a JSON array element by element, naming the failing index
pub fn parse_array<T: FromJson>(json: &Value, parsers: &CustomParsers) -> Result<Vec<T>, ParseError> {
    let items = json
        .as_array()
        .ok_or_else(|| ParseError::unexpected_type("array", json))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::from_json(item, parsers).map_err(|source| ParseError::InvalidElement {
                index,
                source: Box::new(source),
            })
        })
        .collect()
}

/// Parse an OCPP enumeration through its serde representation
pub fn parse_enum<E: DeserializeOwned>(json: &Value, type_name: &'static str) -> Result<E, ParseError> {
    let text = json
        .as_str()
        .ok_or_else(|| ParseError::unexpected_type("string", json))?;

    serde_json::from_value(json.clone()).map_err(|_| ParseError::UnknownEnumValue {
        value: text.to_string(),
        type_name,
    })
}

/// Parse a string and enforce the OCPP maximum length
pub fn parse_text(json: &Value, max_len: usize) -> Result<String, ParseError> {
    let text = json
        .as_str()
        .ok_or_else(|| ParseError::unexpected_type("string", json))?;

    let len = text.chars().count();
    if len > max_len {
        return Err(ParseError::InvalidValue(format!(
            "text of {} characters exceeds the maximum of {}",
            len, max_len
        )));
    }
    Ok(text.to_string())
}

// ============================================================================
// Reader
// ============================================================================

/// Field extraction over one JSON object
pub struct JsonReader<'a> {
    object: &'a JsonObject,
    parsers: &'a CustomParsers,
}

impl<'a> JsonReader<'a> {
    /// Wrap `json`, failing when it is not an object. `name` describes the value
    /// being parsed for the error message.
    pub fn new(json: &'a Value, parsers: &'a CustomParsers, name: &str) -> Result<Self, ParseError> {
        let object = json.as_object().ok_or_else(|| ParseError::NotAnObject {
            name: name.to_string(),
        })?;
        Ok(Self { object, parsers })
    }

    pub fn object(&self) -> &'a JsonObject {
        self.object
    }

    pub fn parsers(&self) -> &'a CustomParsers {
        self.parsers
    }

    /// Raw value for `key`; `null` counts as absent
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.object.get(key).filter(|value| !value.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn mandatory<T: FromJson>(&self, key: &str, name: &str) -> Result<T, ParseError> {
        self.mandatory_with(key, name, |value| T::from_json(value, self.parsers))
    }

    pub fn optional<T: FromJson>(&self, key: &str, name: &str) -> Result<Option<T>, ParseError> {
        self.optional_with(key, name, |value| T::from_json(value, self.parsers))
    }

    pub fn mandatory_with<T, F>(&self, key: &str, name: &str, parse: F) -> Result<T, ParseError>
    where
        F: FnOnce(&'a Value) -> Result<T, ParseError>,
    {
        let value = self.get(key).ok_or_else(|| ParseError::missing(key, name))?;
        parse(value).map_err(|source| ParseError::invalid(key, name, source))
    }

    pub fn optional_with<T, F>(&self, key: &str, name: &str, parse: F) -> Result<Option<T>, ParseError>
    where
        F: FnOnce(&'a Value) -> Result<T, ParseError>,
    {
        self.get(key)
            .map(|value| parse(value).map_err(|source| ParseError::invalid(key, name, source)))
            .transpose()
    }

    pub fn mandatory_text(&self, key: &str, name: &str, max_len: usize) -> Result<String, ParseError> {
        self.mandatory_with(key, name, |value| parse_text(value, max_len))
    }

    pub fn optional_text(&self, key: &str, name: &str, max_len: usize) -> Result<Option<String>, ParseError> {
        self.optional_with(key, name, |value| parse_text(value, max_len))
    }

    pub fn mandatory_enum<E: DeserializeOwned>(
        &self,
        key: &str,
        name: &str,
        type_name: &'static str,
    ) -> Result<E, ParseError> {
        self.mandatory_with(key, name, |value| parse_enum(value, type_name))
    }

    pub fn optional_enum<E: DeserializeOwned>(
        &self,
        key: &str,
        name: &str,
        type_name: &'static str,
    ) -> Result<Option<E>, ParseError> {
        self.optional_with(key, name, |value| parse_enum(value, type_name))
    }

    pub fn optional_i32_in_range(
        &self,
        key: &str,
        name: &str,
        range: RangeInclusive<i32>,
    ) -> Result<Option<i32>, ParseError> {
        self.optional_with(key, name, |value| {
            let number = i32::from_json(value, self.parsers)?;
            if range.contains(&number) {
                Ok(number)
            } else {
                Err(ParseError::InvalidValue(format!(
                    "{} is outside {}..={}",
                    number,
                    range.start(),
                    range.end()
                )))
            }
        })
    }

    pub fn mandatory_vec<T: FromJson>(&self, key: &str, name: &str) -> Result<Vec<T>, ParseError> {
        self.mandatory_with(key, name, |value| parse_array(value, self.parsers))
    }

    /// An absent collection parses as empty
    pub fn optional_vec<T: FromJson>(&self, key: &str, name: &str) -> Result<Vec<T>, ParseError> {
        Ok(self
            .optional_with(key, name, |value| parse_array(value, self.parsers))?
            .unwrap_or_default())
    }

    pub fn mandatory_non_empty_vec<T: FromJson>(&self, key: &str, name: &str) -> Result<Vec<T>, ParseError> {
        let items = self.mandatory_vec(key, name)?;
        if items.is_empty() {
            return Err(ParseError::EmptyCollection {
                key: key.to_string(),
                name: name.to_string(),
            });
        }
        Ok(items)
    }

    /// Parse an array into a set; wire order and duplicates are not preserved
    pub fn mandatory_set<T: FromJson + Eq + Hash>(&self, key: &str, name: &str) -> Result<HashSet<T>, ParseError> {
        Ok(self.mandatory_vec(key, name)?.into_iter().collect())
    }

    pub fn optional_set<T: FromJson + Eq + Hash>(&self, key: &str, name: &str) -> Result<HashSet<T>, ParseError> {
        Ok(self.optional_vec(key, name)?.into_iter().collect())
    }
}

// ============================================================================
// Writer
// ============================================================================

/// Builds a JSON object, skipping absent optional fields and empty collections
pub struct JsonWriter<'a> {
    object: JsonObject,
    serializers: &'a CustomSerializers,
}

impl<'a> JsonWriter<'a> {
    pub fn new(serializers: &'a CustomSerializers) -> Self {
        Self {
            object: JsonObject::new(),
            serializers,
        }
    }

    pub fn serializers(&self) -> &'a CustomSerializers {
        self.serializers
    }

    pub fn field<T: ToJson + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.object
            .insert(key.to_string(), value.to_json_with(self.serializers));
        self
    }

    pub fn optional<T: ToJson>(self, key: &str, value: Option<&T>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    pub fn enumeration<E: Serialize>(mut self, key: &str, value: &E) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => {
                self.object.insert(key.to_string(), json);
            }
            Err(e) => warn!("Failed to serialize enumeration '{}': {}", key, e),
        }
        self
    }

    pub fn optional_enumeration<E: Serialize>(self, key: &str, value: Option<&E>) -> Self {
        match value {
            Some(value) => self.enumeration(key, value),
            None => self,
        }
    }

    /// Always emitted, even when empty
    pub fn array<'b, T, I>(mut self, key: &str, items: I) -> Self
    where
        T: ToJson + 'b,
        I: IntoIterator<Item = &'b T>,
    {
        let values = items
            .into_iter()
            .map(|item| item.to_json_with(self.serializers))
            .collect();
        self.object.insert(key.to_string(), Value::Array(values));
        self
    }

    /// Omitted when empty
    pub fn non_empty_array<'b, T, I>(self, key: &str, items: I) -> Self
    where
        T: ToJson + 'b,
        I: IntoIterator<Item = &'b T>,
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return self;
        }
        self.array(key, items)
    }

    pub fn raw(mut self, key: &str, value: Value) -> Self {
        self.object.insert(key.to_string(), value);
        self
    }

    pub fn finish(self) -> Value {
        Value::Object(self.object)
    }
}

// ============================================================================
// Hashing helpers
// ============================================================================

/// Hash a collection independently of iteration order
pub fn hash_unordered<'a, T, I, H>(items: I, state: &mut H)
where
    T: Hash + 'a,
    I: IntoIterator<Item = &'a T>,
    H: Hasher,
{
    let mut combined: u64 = 0;
    let mut count: usize = 0;
    for item in items {
        combined = combined.wrapping_add(hash_of(item));
        count += 1;
    }
    state.write_u64(combined);
    state.write_usize(count);
}

/// Stable 64-bit hash of a single value
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Hash an arbitrary JSON value consistently with `Value` equality: object
/// keys in sorted order, decimals through [`hash_f64`]
pub fn hash_json<H: Hasher>(value: &Value, state: &mut H) {
    match value {
        Value::Null => state.write_u8(0),
        Value::Bool(flag) => {
            state.write_u8(1);
            flag.hash(state);
        }
        Value::Number(number) => {
            state.write_u8(2);
            if let Some(unsigned) = number.as_u64() {
                unsigned.hash(state);
            } else if let Some(signed) = number.as_i64() {
                signed.hash(state);
            } else {
                hash_f64(number.as_f64().unwrap_or_default(), state);
            }
        }
        Value::String(text) => {
            state.write_u8(3);
            text.hash(state);
        }
        Value::Array(items) => {
            state.write_u8(4);
            state.write_usize(items.len());
            for item in items {
                hash_json(item, state);
            }
        }
        Value::Object(object) => {
            state.write_u8(5);
            state.write_usize(object.len());
            let mut entries: Vec<_> = object.iter().collect();
            entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
            for (key, item) in entries {
                key.hash(state);
                hash_json(item, state);
            }
        }
    }
}

/// Hash a decimal by its bit pattern, folding `-0.0` onto `0.0`
pub fn hash_f64<H: Hasher>(value: f64, state: &mut H) {
    let normalized = if value == 0.0 { 0.0 } else { value };
    normalized.to_bits().hash(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    enum Colour {
        Red,
        Green,
    }

    fn reader(json: &Value) -> JsonReader<'_> {
        static NONE: std::sync::OnceLock<CustomParsers> = std::sync::OnceLock::new();
        JsonReader::new(json, NONE.get_or_init(CustomParsers::none), "test object").unwrap()
    }

    #[test]
    fn test_reader_rejects_non_object() {
        let parsers = CustomParsers::none();
        let err = JsonReader::new(&json!([1, 2]), &parsers, "Heartbeat request").err().unwrap();
        assert!(err.to_string().contains("Heartbeat request"));
    }

    #[test]
    fn test_mandatory_field_missing_names_key() {
        let json = json!({});
        let err = reader(&json).mandatory::<String>("vendorId", "vendor identification").unwrap_err();
        assert_eq!(err, ParseError::missing("vendorId", "vendor identification"));
    }

    #[test]
    fn test_optional_field_three_states() {
        let json = json!({ "present": "yes", "broken": 12, "nothing": null });
        let r = reader(&json);

        assert_eq!(r.optional::<String>("absent", "absent").unwrap(), None);
        assert_eq!(r.optional::<String>("nothing", "nothing").unwrap(), None);
        assert_eq!(r.optional::<String>("present", "present").unwrap(), Some("yes".to_string()));

        let err = r.optional::<String>("broken", "broken field").unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { ref key, .. } if key == "broken"));
    }

    #[test]
    fn test_enum_parsing_reports_unknown_value() {
        let json = json!({ "colour": "Blue", "ok": "Green" });
        let r = reader(&json);

        let colour: Colour = r.mandatory_enum("ok", "colour", "Colour").unwrap();
        assert_eq!(colour, Colour::Green);

        let err = r.mandatory_enum::<Colour>("colour", "colour", "Colour").unwrap_err();
        assert_eq!(
            err.root_cause(),
            &ParseError::UnknownEnumValue {
                value: "Blue".to_string(),
                type_name: "Colour"
            }
        );
    }

    #[test]
    fn test_text_length_enforced() {
        let json = json!({ "code": "abcdef" });
        let r = reader(&json);

        assert_eq!(r.mandatory_text("code", "code", 6).unwrap(), "abcdef");
        assert!(r.mandatory_text("code", "code", 5).is_err());
    }

    #[test]
    fn test_range_check() {
        let json = json!({ "priority": 12, "fine": -3 });
        let r = reader(&json);

        assert_eq!(r.optional_i32_in_range("fine", "priority", -9..=9).unwrap(), Some(-3));
        assert!(r.optional_i32_in_range("priority", "priority", -9..=9).is_err());
    }

    #[test]
    fn test_vec_helpers() {
        let json = json!({ "empty": [], "items": ["a", "b", "a"], "bad": ["a", 1] });
        let r = reader(&json);

        assert!(r.optional_vec::<String>("missing", "missing").unwrap().is_empty());
        assert!(matches!(
            r.mandatory_non_empty_vec::<String>("empty", "empty list"),
            Err(ParseError::EmptyCollection { .. })
        ));
        assert_eq!(r.mandatory_set::<String>("items", "items").unwrap().len(), 2);

        match r.mandatory_vec::<String>("bad", "bad list").unwrap_err() {
            ParseError::InvalidField { source, .. } => {
                assert!(matches!(*source, ParseError::InvalidElement { index: 1, .. }));
            }
            other => panic!("Expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn test_timestamp_round_trip_keeps_precision() {
        let parsers = CustomParsers::none();
        let json = json!("2026-01-20T12:00:00.123456Z");
        let timestamp = DateTime::<Utc>::from_json(&json, &parsers).unwrap();
        assert_eq!(timestamp.to_json(), json);
    }

    #[test]
    fn test_writer_omits_absent_fields() {
        let serializers = CustomSerializers::none();
        let empty: Vec<String> = Vec::new();
        let json = JsonWriter::new(&serializers)
            .field("a", &"x".to_string())
            .optional::<String>("b", None)
            .non_empty_array("c", &empty)
            .array("d", &empty)
            .optional_enumeration::<Colour>("e", None)
            .enumeration("f", &Colour::Red)
            .finish();

        assert_eq!(json, json!({ "a": "x", "d": [], "f": "Red" }));
    }

    #[test]
    fn test_unordered_hash_ignores_order() {
        let mut a = DefaultHasher::new();
        let mut b = DefaultHasher::new();
        hash_unordered(&["x", "y", "z"], &mut a);
        hash_unordered(&["z", "x", "y"], &mut b);
        assert_eq!(a.finish(), b.finish());
    }

    fn json_hash(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        hash_json(value, &mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_decimal_hash_folds_negative_zero() {
        let mut a = DefaultHasher::new();
        let mut b = DefaultHasher::new();
        hash_f64(0.0, &mut a);
        hash_f64(-0.0, &mut b);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_json_hash_agrees_with_equality() {
        let positive = json!({ "x": 0.0, "nested": [{ "y": 0.0 }] });
        let negative = json!({ "x": -0.0, "nested": [{ "y": -0.0 }] });
        assert_eq!(positive, negative);
        assert_eq!(json_hash(&positive), json_hash(&negative));

        let a: Value = serde_json::from_str(r#"{"b":1,"a":[true,null,"s"]}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a":[true,null,"s"],"b":1}"#).unwrap();
        assert_eq!(json_hash(&a), json_hash(&b));
    }

    #[test]
    fn test_json_hash_separates_shapes() {
        assert_ne!(json_hash(&json!([1, 2])), json_hash(&json!([2, 1])));
        assert_ne!(json_hash(&json!({ "a": 1 })), json_hash(&json!({ "a": "1" })));
        assert_ne!(json_hash(&json!(-1)), json_hash(&json!(1)));
        assert_ne!(json_hash(&json!([[]])), json_hash(&json!([])));
    }
}
