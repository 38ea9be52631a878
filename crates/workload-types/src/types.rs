//! Field type tokens for collection definitions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// BSON-like type token declared for a field in a collection definition.
///
/// The JSON format uses the lower camel case names of the original
/// collection definitions:
///
/// ```json
/// {"type": "string"}
/// {"type": "objectId"}
/// {"type": "decimal"}
/// ```
///
/// Tokens outside the known set are preserved as [`FieldType::Unknown`] so
/// that a definition with a typo still loads; such fields generate null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FieldType {
    #[default]
    String,
    Int,
    Double,
    Bool,
    Date,
    ObjectId,
    Array,
    Object,
    Timestamp,
    Long,
    Decimal,
    /// Unrecognised type token
    Unknown(String),
}

/// Every known type token, in declaration order.
pub const KNOWN_TYPE_TOKENS: [&str; 11] = [
    "string",
    "int",
    "double",
    "bool",
    "date",
    "objectId",
    "array",
    "object",
    "timestamp",
    "long",
    "decimal",
];

impl FieldType {
    /// Parse a type token, returning `None` for tokens outside the known set.
    pub fn from_token(token: &str) -> Option<Self> {
        let ty = match token {
            "string" => Self::String,
            "int" => Self::Int,
            "double" => Self::Double,
            "bool" => Self::Bool,
            "date" => Self::Date,
            "objectId" => Self::ObjectId,
            "array" => Self::Array,
            "object" => Self::Object,
            "timestamp" => Self::Timestamp,
            "long" => Self::Long,
            "decimal" => Self::Decimal,
            _ => return None,
        };
        Some(ty)
    }

    /// The token this type is written as in definitions and placeholders.
    pub fn token(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::ObjectId => "objectId",
            Self::Array => "array",
            Self::Object => "object",
            Self::Timestamp => "timestamp",
            Self::Long => "long",
            Self::Decimal => "decimal",
            Self::Unknown(token) => token,
        }
    }

    /// Whether range and increment operators apply to this type.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Double | Self::Decimal)
    }

    /// Whether this type only supports equality matching.
    pub fn is_exact_only(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::Date | Self::Timestamp | Self::ObjectId
        )
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_token(s).unwrap_or_else(|| Self::Unknown(s.to_string())))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Ok(Self::from_token(&token).unwrap_or(Self::Unknown(token)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_known_tokens() {
        for token in KNOWN_TYPE_TOKENS {
            let ty = FieldType::from_token(token).unwrap();
            assert_eq!(ty.token(), token);
        }
    }

    #[test]
    fn test_unknown_token_is_preserved() {
        let ty: FieldType = serde_json::from_str("\"uuid\"").unwrap();
        assert_eq!(ty, FieldType::Unknown("uuid".to_string()));
        assert_eq!(ty.to_string(), "uuid");
        assert!(FieldType::from_token("uuid").is_none());
    }

    #[test]
    fn test_numeric_classification() {
        assert!(FieldType::Int.is_numeric());
        assert!(FieldType::Decimal.is_numeric());
        assert!(!FieldType::String.is_numeric());
        assert!(FieldType::ObjectId.is_exact_only());
        assert!(!FieldType::Array.is_exact_only());
    }
}
