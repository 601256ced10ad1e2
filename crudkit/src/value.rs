//! Scalar values used both as bound parameters and as result cells

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar SQL value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
    /// UUID value
    #[cfg(feature = "uuid-support")]
    Uuid(uuid::Uuid),
    /// Timestamp without time zone
    #[cfg(feature = "datetime-support")]
    Timestamp(chrono::NaiveDateTime),
    /// Timestamp with time zone, normalized to UTC
    #[cfg(feature = "datetime-support")]
    TimestampTz(chrono::DateTime<chrono::Utc>),
    /// Arbitrary precision decimal
    #[cfg(feature = "decimal-support")]
    Decimal(rust_decimal::Decimal),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::F32(_) => "REAL",
            Value::F64(_) => "DOUBLE PRECISION",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BYTEA",
            Value::Json(_) => "JSON",
            #[cfg(feature = "uuid-support")]
            Value::Uuid(_) => "UUID",
            #[cfg(feature = "datetime-support")]
            Value::Timestamp(_) => "TIMESTAMP",
            #[cfg(feature = "datetime-support")]
            Value::TimestampTz(_) => "TIMESTAMPTZ",
            #[cfg(feature = "decimal-support")]
            Value::Decimal(_) => "NUMERIC",
        }
    }

    /// Integer view of the value, widening `I32`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I32(i) => Some(i64::from(*i)),
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(f) => Some(f64::from(*f)),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert to a JSON value. Bytes become an array of numbers and
    /// non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Number, Value as Json};

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::I32(i) => Json::Number(Number::from(*i)),
            Value::I64(i) => Json::Number(Number::from(*i)),
            Value::F32(f) => Number::from_f64(f64::from(*f))
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::F64(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Bytes(b) => Json::Array(
                b.iter()
                    .map(|byte| Json::Number(Number::from(*byte)))
                    .collect(),
            ),
            Value::Json(j) => j.clone(),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => Json::String(u.to_string()),
            #[cfg(feature = "datetime-support")]
            Value::Timestamp(t) => Json::String(t.to_string()),
            #[cfg(feature = "datetime-support")]
            Value::TimestampTz(t) => Json::String(t.to_rfc3339()),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => Json::String(d.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(i) => write!(f, "{}", i),
            Value::I64(i) => write!(f, "{}", i),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Json(j) => write!(f, "{}", j),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => write!(f, "{}", u),
            #[cfg(feature = "datetime-support")]
            Value::Timestamp(t) => write!(f, "{}", t),
            #[cfg(feature = "datetime-support")]
            Value::TimestampTz(t) => write!(f, "{}", t.to_rfc3339()),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => write!(f, "{}", d),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i16> for Value {
    fn from(val: i16) -> Self {
        Value::I32(i32::from(val))
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<&[u8]> for Value {
    fn from(val: &[u8]) -> Self {
        Value::Bytes(val.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::Uuid(val)
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::Timestamp(val)
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        Value::TimestampTz(val)
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::Decimal(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
