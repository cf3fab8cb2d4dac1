//! Wire value types

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

/// A date-time leaf as delivered by a native-document driver.
///
/// Drivers differ in how they tag UTC, so all three forms are representable
/// here; only UTC-tagged values are accepted when decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum WireDateTime {
    /// Tagged with the standard UTC zone
    Utc(DateTime<Utc>),
    /// Tagged with an explicit fixed offset (which may be zero)
    Offset(DateTime<FixedOffset>),
    /// No timezone at all
    Naive(NaiveDateTime),
}

impl WireDateTime {
    /// Returns the value as UTC if it is tagged as UTC.
    ///
    /// A zero fixed offset counts as UTC; naive values and any other offset
    /// do not.
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            WireDateTime::Utc(dt) => Some(*dt),
            WireDateTime::Offset(dt) if dt.offset().fix().local_minus_utc() == 0 => {
                Some(dt.with_timezone(&Utc))
            }
            WireDateTime::Offset(_) | WireDateTime::Naive(_) => None,
        }
    }

    /// Returns a short description of the timezone tagging.
    pub fn zone_name(&self) -> String {
        match self {
            WireDateTime::Utc(_) => "UTC".to_string(),
            WireDateTime::Offset(dt) => dt.offset().to_string(),
            WireDateTime::Naive(_) => "naive".to_string(),
        }
    }
}

/// A wire value.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<WireValue>),
    Object(BTreeMap<String, WireValue>),
    /// Raw binary (native-document only)
    Bytes(Vec<u8>),
    /// Date-time (native-document only)
    DateTime(WireDateTime),
}

impl WireValue {
    /// Returns the wire type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "bool",
            WireValue::Int(_) => "int",
            WireValue::Float(_) => "float",
            WireValue::Str(_) => "string",
            WireValue::Array(_) => "array",
            WireValue::Object(_) => "object",
            WireValue::Bytes(_) => "bytes",
            WireValue::DateTime(_) => "datetime",
        }
    }

    /// Builds an object from key/value pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, WireValue)>,
    {
        WireValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            WireValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            WireValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            WireValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            WireValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<WireValue>> {
        match self {
            WireValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, WireValue>> {
        match self {
            WireValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key if this is an object.
    pub fn get(&self, key: &str) -> Option<&WireValue> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl From<bool> for WireValue {
    fn from(value: bool) -> Self {
        WireValue::Bool(value)
    }
}

impl From<i64> for WireValue {
    fn from(value: i64) -> Self {
        WireValue::Int(value)
    }
}

impl From<f64> for WireValue {
    fn from(value: f64) -> Self {
        WireValue::Float(value)
    }
}

impl From<&str> for WireValue {
    fn from(value: &str) -> Self {
        WireValue::Str(value.to_string())
    }
}

impl From<String> for WireValue {
    fn from(value: String) -> Self {
        WireValue::Str(value)
    }
}

impl From<Vec<WireValue>> for WireValue {
    fn from(items: Vec<WireValue>) -> Self {
        WireValue::Array(items)
    }
}

impl From<DateTime<Utc>> for WireValue {
    fn from(value: DateTime<Utc>) -> Self {
        WireValue::DateTime(WireDateTime::Utc(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_type_names() {
        assert_eq!(WireValue::Null.type_name(), "null");
        assert_eq!(WireValue::Int(1).type_name(), "int");
        assert_eq!(WireValue::Float(1.0).type_name(), "float");
        assert_eq!(WireValue::Bytes(vec![1]).type_name(), "bytes");
        assert_eq!(WireValue::object([("a", WireValue::Null)]).type_name(), "object");
    }

    #[test]
    fn test_object_lookup() {
        let obj = WireValue::object([("x", WireValue::Int(1)), ("y", WireValue::from("two"))]);
        assert_eq!(obj.get("x").and_then(WireValue::as_i64), Some(1));
        assert_eq!(obj.get("y").and_then(WireValue::as_str), Some("two"));
        assert!(obj.get("z").is_none());
        assert!(WireValue::Int(3).get("x").is_none());
    }

    #[test]
    fn test_utc_tagging() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(WireDateTime::Utc(utc).as_utc(), Some(utc));

        let zero = utc.with_timezone(&FixedOffset::east_opt(0).unwrap());
        assert_eq!(WireDateTime::Offset(zero).as_utc(), Some(utc));

        let plus_two = utc.with_timezone(&FixedOffset::east_opt(7200).unwrap());
        assert_eq!(WireDateTime::Offset(plus_two).as_utc(), None);

        assert_eq!(WireDateTime::Naive(utc.naive_utc()).as_utc(), None);
        assert_eq!(WireDateTime::Naive(utc.naive_utc()).zone_name(), "naive");
    }
}
