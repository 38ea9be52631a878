//! Generated value representations.
//!
//! Values produced by the generator stay database-neutral until they reach
//! the store boundary, where `mongodb-types` converts them to BSON.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// A generated document: field name to value.
pub type GeneratedDocument = BTreeMap<String, GeneratedValue>;

/// Raw generated value.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedValue {
    /// Null value
    Null,

    /// Boolean value
    Bool(bool),

    /// 32-bit signed integer
    Int32(i32),

    /// 64-bit signed integer
    Int64(i64),

    /// 64-bit floating point
    Double(f64),

    /// Decimal value kept as its string representation
    Decimal(String),

    /// String value
    String(String),

    /// Date/time in UTC
    DateTime(DateTime<Utc>),

    /// 12-byte object identifier
    ObjectId([u8; 12]),

    /// Array of values
    Array(Vec<GeneratedValue>),

    /// Nested document
    Object(BTreeMap<String, GeneratedValue>),
}

impl GeneratedValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of this value, if it has one.
    ///
    /// Decimals are parsed from their string form.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int32(i) => Some(*i as f64),
            Self::Int64(i) => Some(*i as f64),
            Self::Double(f) => Some(*f),
            Self::Decimal(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an array.
    pub fn as_array(&self) -> Option<&[GeneratedValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the value kind, used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int",
            Self::Int64(_) => "long",
            Self::Double(_) => "double",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::DateTime(_) => "date",
            Self::ObjectId(_) => "objectId",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Add `delta` to a numeric value, keeping its kind.
    ///
    /// Returns `None` for non-numeric values.
    pub fn offset_by(&self, delta: f64) -> Option<GeneratedValue> {
        let value = match self {
            Self::Int32(i) => Self::Int32(i.saturating_add(delta.round() as i32)),
            Self::Int64(i) => Self::Int64(i.saturating_add(delta.round() as i64)),
            Self::Double(f) => Self::Double(round2(f + delta)),
            Self::Decimal(s) => {
                let parsed: f64 = s.parse().ok()?;
                Self::Decimal(format!("{:.2}", parsed + delta))
            }
            _ => return None,
        };
        Some(value)
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl fmt::Display for GeneratedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int32(i) => write!(f, "{i}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Decimal(s) => write!(f, "{s}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::ObjectId(bytes) => {
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for GeneratedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for GeneratedValue {
    fn from(i: i32) -> Self {
        Self::Int32(i)
    }
}

impl From<i64> for GeneratedValue {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<f64> for GeneratedValue {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<&str> for GeneratedValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for GeneratedValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
