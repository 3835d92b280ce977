//! Scalar values bound to statements and read back from result rows.
//!
//! [`Value`] is the only type that crosses the builder/driver boundary: WHERE
//! operands, insert/update data and result columns are all scalars. Composite
//! inputs (JSON arrays and objects) are rejected with
//! [`OrmError::UnsupportedType`]; wrap sub-queries in
//! [`SubQuery`](crate::SubQuery) instead.

mod decode;
mod to_sql;

pub(crate) use decode::decode_column;

use crate::error::{OrmError, OrmResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type signature character of a bound value.
///
/// Each bound value contributes exactly one character to the statement's type
/// signature: `s` for text and null, `i` for booleans and integers, `d` for
/// floating-point numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindType {
    /// Text and null values (`s`)
    Text,
    /// Boolean and integer values (`i`)
    Integer,
    /// Floating-point values (`d`)
    Decimal,
}

impl BindType {
    /// The signature character.
    pub fn as_char(self) -> char {
        match self {
            BindType::Text => 's',
            BindType::Integer => 'i',
            BindType::Decimal => 'd',
        }
    }
}

/// A scalar SQL value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Signature character class of this value.
    pub fn bind_type(&self) -> BindType {
        match self {
            Value::Null | Value::Text(_) => BindType::Text,
            Value::Bool(_) | Value::Int(_) => BindType::Integer,
            Value::Float(_) => BindType::Decimal,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Text(s) => parse_bool(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render this value the way the trace and `last_query` show it.
    pub(crate) fn display_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => format!("'{}'", i64::from(*b)),
            Value::Int(i) => format!("'{i}'"),
            Value::Float(f) => format!("'{f}'"),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

pub(crate) fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" | "on" => Some(true),
        "0" | "f" | "false" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Text(v.to_string())
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Value
where
    Tz::Offset: fmt::Display,
{
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Value::Text(v.to_rfc3339())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = OrmError;

    fn try_from(v: serde_json::Value) -> OrmResult<Self> {
        match v {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Err(OrmError::unsupported_type(format!(
                        "number {n} does not fit a 64-bit value"
                    )))
                }
            }
            serde_json::Value::String(s) => Ok(Value::Text(s)),
            serde_json::Value::Array(_) => Err(OrmError::unsupported_type(
                "arrays cannot be bound as a single parameter",
            )),
            serde_json::Value::Object(_) => Err(OrmError::unsupported_type(
                "objects cannot be bound as a single parameter",
            )),
        }
    }
}
