//! Conversions between [`WireValue`] and `serde_json::Value`

use serde_json::{Map, Number, Value};

use super::errors::{WireError, WireResult};
use super::value::WireValue;

impl WireValue {
    /// Converts parsed JSON into wire data.
    ///
    /// Integers that do not fit an `i64` are carried as floats.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => WireValue::Int(i),
                None => WireValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => WireValue::Str(s),
            Value::Array(items) => {
                WireValue::Array(items.into_iter().map(WireValue::from_json).collect())
            }
            Value::Object(map) => WireValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, WireValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts wire data into JSON.
    ///
    /// Fails for binary and date-time leaves and for non-finite floats.
    pub fn to_json(&self) -> WireResult<Value> {
        Ok(match self {
            WireValue::Null => Value::Null,
            WireValue::Bool(b) => Value::Bool(*b),
            WireValue::Int(i) => Value::Number((*i).into()),
            WireValue::Float(f) => Value::Number(Number::from_f64(*f).ok_or(WireError::NonFiniteFloat)?),
            WireValue::Str(s) => Value::String(s.clone()),
            WireValue::Array(items) => {
                Value::Array(items.iter().map(WireValue::to_json).collect::<WireResult<_>>()?)
            }
            WireValue::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json()?);
                }
                Value::Object(out)
            }
            WireValue::Bytes(_) | WireValue::DateTime(_) => {
                return Err(WireError::NotJsonRepresentable {
                    type_name: self.type_name(),
                })
            }
        })
    }

    /// Parses JSON text into wire data.
    pub fn parse_json(text: &str) -> WireResult<Self> {
        serde_json::from_str::<Value>(text)
            .map(WireValue::from_json)
            .map_err(|e| WireError::InvalidJson(e.to_string()))
    }
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        WireValue::from_json(value)
    }
}

impl TryFrom<WireValue> for Value {
    type Error = WireError;

    fn try_from(value: WireValue) -> WireResult<Self> {
        value.to_json()
    }
}
