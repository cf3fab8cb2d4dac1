//! Codec strategies
//!
//! A [`Codec`] fixes the wire conventions the inputter and outputter use:
//!
//! | Concern          | `JsonLike`                     | `NativeDoc`               |
//! |------------------|--------------------------------|---------------------------|
//! | bytes            | base64 text                    | raw binary leaf           |
//! | datetime         | `[y, mo, d, h, mi, s, us]` ints | native UTC date-time leaf |
//! | legal `Any` data | JSON primitives, finite floats | plus bytes and UTC dates  |
//!
//! Every branch here is an exhaustive match, so adding a backend means adding
//! a variant and filling in these three concerns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::io::{index_path, key_path, CodecError, CodecResult};
use crate::wire::{WireDateTime, WireValue};

/// Number of integers in a JSON-like datetime.
const DATETIME_PARTS: usize = 7;

/// Wire convention profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    /// JSON-compatible primitive trees
    #[default]
    JsonLike,
    /// Document-database driver values with native bytes and datetimes
    NativeDoc,
}

impl Codec {
    /// Returns the codec name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Codec::JsonLike => "json_like",
            Codec::NativeDoc => "native_doc",
        }
    }

    /// Whether a single wire leaf may appear in `Any`-typed data.
    ///
    /// Containers always qualify here; their contents are checked by
    /// [`Codec::check_any`].
    pub fn is_legal_leaf(&self, value: &WireValue) -> bool {
        match value {
            WireValue::Null
            | WireValue::Bool(_)
            | WireValue::Int(_)
            | WireValue::Str(_)
            | WireValue::Array(_)
            | WireValue::Object(_) => true,
            WireValue::Float(f) => match self {
                Codec::JsonLike => f.is_finite(),
                Codec::NativeDoc => true,
            },
            WireValue::Bytes(_) => match self {
                Codec::JsonLike => false,
                Codec::NativeDoc => true,
            },
            WireValue::DateTime(dt) => match self {
                Codec::JsonLike => false,
                Codec::NativeDoc => dt.as_utc().is_some(),
            },
        }
    }

    /// Verifies a whole wire tree is legal `Any` data under this codec.
    pub fn check_any(
        &self,
        value: &WireValue,
        path: &str,
        depth: usize,
        max_depth: usize,
    ) -> CodecResult<()> {
        if depth > max_depth {
            tracing::debug!(path, max_depth, "depth limit reached in any-typed data");
            return Err(CodecError::limit_error(path, max_depth));
        }
        if !self.is_legal_leaf(value) {
            return Err(CodecError::type_error(
                path,
                format!(
                    "{} value is not legal for any-typed data under the {} codec",
                    value.type_name(),
                    self.name()
                ),
            ));
        }
        match value {
            WireValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.check_any(item, &index_path(path, i), depth + 1, max_depth)?;
                }
            }
            WireValue::Object(map) => {
                for (key, item) in map {
                    self.check_any(item, &key_path(path, key), depth + 1, max_depth)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Produces the wire form of binary data.
    pub fn encode_bytes(&self, bytes: &[u8]) -> WireValue {
        match self {
            Codec::JsonLike => WireValue::Str(STANDARD.encode(bytes)),
            Codec::NativeDoc => WireValue::Bytes(bytes.to_vec()),
        }
    }

    /// Reads binary data from its wire form.
    pub fn decode_bytes(&self, value: &WireValue, path: &str) -> CodecResult<Vec<u8>> {
        match self {
            Codec::JsonLike => {
                let text = match value {
                    WireValue::Str(text) => text,
                    other => return Err(CodecError::type_mismatch(path, "base64 string", other.type_name())),
                };
                STANDARD
                    .decode(text)
                    .map_err(|e| CodecError::value_error(path, format!("invalid base64: {}", e)))
            }
            Codec::NativeDoc => match value {
                WireValue::Bytes(bytes) => Ok(bytes.clone()),
                other => Err(CodecError::type_mismatch(path, "bytes", other.type_name())),
            },
        }
    }

    /// Produces the wire form of a UTC datetime.
    ///
    /// The JSON-like form carries microseconds, so finer precision is
    /// refused rather than silently truncated.
    pub fn encode_datetime(&self, dt: &DateTime<Utc>, path: &str) -> CodecResult<WireValue> {
        match self {
            Codec::JsonLike => {
                let nanos = dt.nanosecond();
                if nanos >= 1_000_000_000 {
                    return Err(CodecError::value_error(path, "leap seconds cannot be encoded"));
                }
                if nanos % 1_000 != 0 {
                    return Err(CodecError::value_error(
                        path,
                        "datetime has sub-microsecond precision",
                    ));
                }
                Ok(WireValue::Array(vec![
                    WireValue::Int(i64::from(dt.year())),
                    WireValue::Int(i64::from(dt.month())),
                    WireValue::Int(i64::from(dt.day())),
                    WireValue::Int(i64::from(dt.hour())),
                    WireValue::Int(i64::from(dt.minute())),
                    WireValue::Int(i64::from(dt.second())),
                    WireValue::Int(i64::from(nanos / 1_000)),
                ]))
            }
            Codec::NativeDoc => Ok(WireValue::DateTime(WireDateTime::Utc(*dt))),
        }
    }

    /// Reads a UTC datetime from its wire form.
    pub fn decode_datetime(&self, value: &WireValue, path: &str) -> CodecResult<DateTime<Utc>> {
        match self {
            Codec::JsonLike => datetime_from_parts(value, path),
            Codec::NativeDoc => match value {
                WireValue::DateTime(dt) => dt.as_utc().ok_or_else(|| {
                    CodecError::value_error(
                        path,
                        format!("datetime must be tagged UTC, got {}", dt.zone_name()),
                    )
                }),
                other => Err(CodecError::type_mismatch(path, "datetime", other.type_name())),
            },
        }
    }
}

/// Rebuilds a UTC datetime from `[year, month, day, hour, minute, second, microsecond]`.
fn datetime_from_parts(value: &WireValue, path: &str) -> CodecResult<DateTime<Utc>> {
    let items = match value {
        WireValue::Array(items) => items,
        other => return Err(CodecError::type_mismatch(path, "datetime array", other.type_name())),
    };
    if items.len() != DATETIME_PARTS {
        return Err(CodecError::value_error(
            path,
            format!("datetime array must have {} items, got {}", DATETIME_PARTS, items.len()),
        ));
    }

    let mut parts = [0i64; DATETIME_PARTS];
    for (i, item) in items.iter().enumerate() {
        parts[i] = match item {
            WireValue::Int(n) => *n,
            other => return Err(CodecError::type_mismatch(&index_path(path, i), "int", other.type_name())),
        };
    }

    let invalid = || CodecError::value_error(path, format!("invalid datetime components {:?}", parts));
    let year = i32::try_from(parts[0]).map_err(|_| invalid())?;
    let rest: Vec<u32> = parts[1..]
        .iter()
        .map(|p| u32::try_from(*p))
        .collect::<Result<_, _>>()
        .map_err(|_| invalid())?;

    // Leap-second micros (>= 1s) are accepted by chrono but cannot be re-encoded.
    if rest[5] >= 1_000_000 {
        return Err(invalid());
    }

    NaiveDate::from_ymd_opt(year, rest[0], rest[1])
        .and_then(|date| date.and_hms_micro_opt(rest[2], rest[3], rest[4], rest[5]))
        .map(|naive| naive.and_utc())
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ErrorKind;
    use chrono::{FixedOffset, TimeZone};

    fn sample_dt() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap() + chrono::Duration::microseconds(250)
    }

    #[test]
    fn test_codec_names_match_config_form() {
        for codec in [Codec::JsonLike, Codec::NativeDoc] {
            assert_eq!(serde_json::to_value(codec).unwrap(), serde_json::json!(codec.name()));
        }
    }

    #[test]
    fn test_bytes_round_trip_both_codecs() {
        let data = b"hello\x00world".to_vec();
        for codec in [Codec::JsonLike, Codec::NativeDoc] {
            let wire = codec.encode_bytes(&data);
            assert_eq!(codec.decode_bytes(&wire, "b").unwrap(), data);
        }
        assert!(matches!(Codec::JsonLike.encode_bytes(&data), WireValue::Str(_)));
        assert!(matches!(Codec::NativeDoc.encode_bytes(&data), WireValue::Bytes(_)));
    }

    #[test]
    fn test_bytes_wrong_form() {
        let err = Codec::JsonLike.decode_bytes(&WireValue::Bytes(vec![1]), "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let err = Codec::JsonLike.decode_bytes(&WireValue::from("!!!"), "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);

        let err = Codec::NativeDoc.decode_bytes(&WireValue::from("aGk="), "b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_json_datetime_parts() {
        let wire = Codec::JsonLike.encode_datetime(&sample_dt(), "t").unwrap();
        let expected: Vec<WireValue> = [2024, 3, 9, 14, 30, 5, 250].iter().map(|n| WireValue::Int(*n)).collect();
        assert_eq!(wire, WireValue::Array(expected));
        assert_eq!(Codec::JsonLike.decode_datetime(&wire, "t").unwrap(), sample_dt());
    }

    #[test]
    fn test_json_datetime_rejects_bad_arrays() {
        let short = WireValue::Array(vec![WireValue::Int(2024); 6]);
        assert_eq!(Codec::JsonLike.decode_datetime(&short, "t").unwrap_err().kind(), ErrorKind::Value);

        let mut parts = vec![WireValue::Int(2024), WireValue::Int(2), WireValue::Int(30)];
        parts.extend(vec![WireValue::Int(0); 4]);
        let feb_30 = WireValue::Array(parts);
        assert_eq!(Codec::JsonLike.decode_datetime(&feb_30, "t").unwrap_err().kind(), ErrorKind::Value);

        let mut parts = vec![WireValue::from("2024")];
        parts.extend(vec![WireValue::Int(1); 6]);
        let err = Codec::JsonLike.decode_datetime(&WireValue::Array(parts), "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.path(), "t[0]");
    }

    #[test]
    fn test_json_datetime_refuses_nanos() {
        let dt = sample_dt() + chrono::Duration::nanoseconds(1);
        let err = Codec::JsonLike.encode_datetime(&dt, "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
        assert!(Codec::NativeDoc.encode_datetime(&dt, "t").is_ok());
    }

    #[test]
    fn test_native_datetime_requires_utc() {
        let dt = sample_dt();
        let utc = WireValue::DateTime(WireDateTime::Utc(dt));
        assert_eq!(Codec::NativeDoc.decode_datetime(&utc, "t").unwrap(), dt);

        let zero = WireValue::DateTime(WireDateTime::Offset(dt.with_timezone(&FixedOffset::east_opt(0).unwrap())));
        assert_eq!(Codec::NativeDoc.decode_datetime(&zero, "t").unwrap(), dt);

        let naive = WireValue::DateTime(WireDateTime::Naive(dt.naive_utc()));
        assert_eq!(Codec::NativeDoc.decode_datetime(&naive, "t").unwrap_err().kind(), ErrorKind::Value);

        let shifted = WireValue::DateTime(WireDateTime::Offset(dt.with_timezone(&FixedOffset::west_opt(3600).unwrap())));
        assert_eq!(Codec::NativeDoc.decode_datetime(&shifted, "t").unwrap_err().kind(), ErrorKind::Value);

        let err = Codec::NativeDoc.decode_datetime(&WireValue::Int(5), "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_any_legality() {
        let tree = WireValue::object([
            ("list", WireValue::Array(vec![WireValue::Int(1), WireValue::Null])),
            ("blob", WireValue::Bytes(vec![1, 2])),
        ]);
        assert!(Codec::NativeDoc.check_any(&tree, "a", 0, 8).is_ok());

        let err = Codec::JsonLike.check_any(&tree, "a", 0, 8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(err.path(), "a{blob}");

        assert!(!Codec::JsonLike.is_legal_leaf(&WireValue::Float(f64::INFINITY)));
        assert!(Codec::NativeDoc.is_legal_leaf(&WireValue::Float(f64::INFINITY)));
    }

    #[test]
    fn test_any_depth_limit() {
        let mut deep = WireValue::Null;
        for _ in 0..10 {
            deep = WireValue::Array(vec![deep]);
        }
        let err = Codec::JsonLike.check_any(&deep, "a", 0, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Limit);
        assert!(Codec::JsonLike.check_any(&deep, "a", 0, 16).is_ok());
    }
}
