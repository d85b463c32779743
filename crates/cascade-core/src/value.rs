//! # Configuration Values
//!
//! The raw value stored under a fully-qualified key, plus the lenient typed
//! conversions the typed getters rely on.
//!
//! ## Conversion Table
//! ```text
//! ┌───────────────┬─────────────────────────────────────────────────────────┐
//! │ Requested     │ Accepted stored values                                 │
//! ├───────────────┼─────────────────────────────────────────────────────────┤
//! │ string        │ anything (bytes decoded lossily, datetimes as RFC 3339) │
//! │ bool          │ bool, int (0 = false), "1/t/true/0/f/false"            │
//! │ int           │ int, whole float, bool, numeric string                 │
//! │ float         │ float, int, numeric string                             │
//! │ datetime      │ datetime, RFC 3339 string, int (unix seconds)          │
//! └───────────────┴─────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A raw configuration value.
///
/// Untagged on the wire. Every JSON string decodes as `String`; a datetime
/// serializes as RFC 3339 and reads back through [`as_date_time`](Self::as_date_time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Bytes(Vec<u8>),
}

/// Whole floats in this range convert to `i64` without saturating.
const I64_FLOAT_MIN: f64 = -9_223_372_036_854_775_808.0;
const I64_FLOAT_END: f64 = 9_223_372_036_854_775_808.0;

impl ConfigValue {
    /// Short name of the stored type, used in error messages.
    pub const fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Int(_) => "int",
            ConfigValue::Float(_) => "float",
            ConfigValue::DateTime(_) => "datetime",
            ConfigValue::String(_) => "string",
            ConfigValue::Bytes(_) => "bytes",
        }
    }

    fn mismatch(&self, expected: &'static str) -> CoreError {
        CoreError::TypeMismatch {
            expected,
            actual: self.type_name(),
        }
    }

    /// Reads the value as a string. Never fails.
    pub fn as_string(&self) -> String {
        match self {
            ConfigValue::String(s) => s.clone(),
            ConfigValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            other => other.to_string(),
        }
    }

    /// Reads the value as a bool.
    pub fn as_bool(&self) -> CoreResult<bool> {
        match self {
            ConfigValue::Bool(b) => Ok(*b),
            ConfigValue::Int(i) => Ok(*i != 0),
            ConfigValue::String(s) => match s.trim() {
                "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
                "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
                _ => Err(self.mismatch("bool")),
            },
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Reads the value as an integer.
    pub fn as_int(&self) -> CoreResult<i64> {
        match self {
            ConfigValue::Int(i) => Ok(*i),
            ConfigValue::Bool(b) => Ok(i64::from(*b)),
            ConfigValue::Float(f)
                if f.fract() == 0.0 && (I64_FLOAT_MIN..I64_FLOAT_END).contains(f) =>
            {
                Ok(*f as i64)
            }
            ConfigValue::String(s) => s.trim().parse().map_err(|_| self.mismatch("int")),
            _ => Err(self.mismatch("int")),
        }
    }

    /// Reads the value as a float.
    pub fn as_float(&self) -> CoreResult<f64> {
        match self {
            ConfigValue::Float(f) => Ok(*f),
            ConfigValue::Int(i) => Ok(*i as f64),
            ConfigValue::String(s) => s.trim().parse().map_err(|_| self.mismatch("float")),
            _ => Err(self.mismatch("float")),
        }
    }

    /// Reads the value as a UTC timestamp.
    pub fn as_date_time(&self) -> CoreResult<DateTime<Utc>> {
        match self {
            ConfigValue::DateTime(dt) => Ok(*dt),
            ConfigValue::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| self.mismatch("datetime")),
            ConfigValue::Int(secs) => {
                DateTime::from_timestamp(*secs, 0).ok_or_else(|| self.mismatch("datetime"))
            }
            _ => Err(self.mismatch("datetime")),
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Bool(b) => write!(f, "{b}"),
            ConfigValue::Int(i) => write!(f, "{i}"),
            ConfigValue::Float(x) => write!(f, "{x}"),
            ConfigValue::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            ConfigValue::String(s) => f.write_str(s),
            ConfigValue::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

// =============================================================================
// Conversions into ConfigValue
// =============================================================================

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::String(v)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(i64::from(v))
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<DateTime<Utc>> for ConfigValue {
    fn from(v: DateTime<Utc>) -> Self {
        ConfigValue::DateTime(v)
    }
}

impl From<Vec<u8>> for ConfigValue {
    fn from(v: Vec<u8>) -> Self {
        ConfigValue::Bytes(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_as_string() {
        assert_eq!(ConfigValue::from("Gopher").as_string(), "Gopher");
        assert_eq!(ConfigValue::from(true).as_string(), "true");
        assert_eq!(ConfigValue::from(2016i64).as_string(), "2016");
        assert_eq!(ConfigValue::from(3.5).as_string(), "3.5");
        assert_eq!(ConfigValue::from(b"raw".to_vec()).as_string(), "raw");
    }

    #[test]
    fn test_as_bool() {
        assert!(ConfigValue::from(true).as_bool().unwrap());
        assert!(ConfigValue::from("1").as_bool().unwrap());
        assert!(ConfigValue::from(" true ").as_bool().unwrap());
        assert!(!ConfigValue::from("False").as_bool().unwrap());
        assert!(!ConfigValue::from(0i64).as_bool().unwrap());
        assert_eq!(
            ConfigValue::from("yes please").as_bool(),
            Err(CoreError::TypeMismatch {
                expected: "bool",
                actual: "string"
            })
        );
        assert!(ConfigValue::from(1.0).as_bool().is_err());
    }

    #[test]
    fn test_as_int() {
        assert_eq!(ConfigValue::from(42i64).as_int().unwrap(), 42);
        assert_eq!(ConfigValue::from("-7").as_int().unwrap(), -7);
        assert_eq!(ConfigValue::from(3.0).as_int().unwrap(), 3);
        assert_eq!(ConfigValue::from(true).as_int().unwrap(), 1);
        assert!(ConfigValue::from(3.25).as_int().is_err());
        assert_eq!(ConfigValue::from(-9.223372036854775808e18).as_int().unwrap(), i64::MIN);
        for out_of_range in [1e20, -1e20, 9.223372036854775808e18, f64::INFINITY, f64::NAN] {
            assert_eq!(
                ConfigValue::from(out_of_range).as_int(),
                Err(CoreError::TypeMismatch {
                    expected: "int",
                    actual: "float"
                }),
                "{out_of_range}"
            );
        }
        assert!(ConfigValue::from("twelve").as_int().is_err());
    }

    #[test]
    fn test_as_float() {
        assert_eq!(ConfigValue::from(2.75).as_float().unwrap(), 2.75);
        assert_eq!(ConfigValue::from(2i64).as_float().unwrap(), 2.0);
        assert_eq!(ConfigValue::from("0.5").as_float().unwrap(), 0.5);
        assert!(ConfigValue::from(false).as_float().is_err());
    }

    #[test]
    fn test_as_date_time() {
        let dt = Utc.with_ymd_and_hms(2016, 2, 29, 12, 0, 0).unwrap();
        assert_eq!(ConfigValue::from(dt).as_date_time().unwrap(), dt);
        assert_eq!(
            ConfigValue::from("2016-02-29T12:00:00Z")
                .as_date_time()
                .unwrap(),
            dt
        );
        assert_eq!(
            ConfigValue::from(dt.timestamp()).as_date_time().unwrap(),
            dt
        );
        assert!(ConfigValue::from("yesterday").as_date_time().is_err());
    }

    #[test]
    fn test_json_untagged() {
        let v: ConfigValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, ConfigValue::Bool(true));
        let v: ConfigValue = serde_json::from_str("12").unwrap();
        assert_eq!(v, ConfigValue::Int(12));
        let v: ConfigValue = serde_json::from_str("1.5").unwrap();
        assert_eq!(v, ConfigValue::Float(1.5));
        let v: ConfigValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(v, ConfigValue::String("hello".into()));

        assert_eq!(
            serde_json::to_string(&ConfigValue::from("x")).unwrap(),
            "\"x\""
        );
    }

    #[test]
    fn test_json_keeps_rfc3339_strings() {
        let stored = ConfigValue::from("2016-02-29T12:00:00Z");
        let json = serde_json::to_string(&stored).unwrap();
        assert_eq!(serde_json::from_str::<ConfigValue>(&json).unwrap(), stored);

        let dt = Utc.with_ymd_and_hms(2016, 2, 29, 12, 0, 0).unwrap();
        let json = serde_json::to_string(&ConfigValue::from(dt)).unwrap();
        let back: ConfigValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back.type_name(), "string");
        assert_eq!(back.as_date_time().unwrap(), dt);
    }
}
