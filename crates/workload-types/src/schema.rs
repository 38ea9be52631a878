//! Collection definitions for workload generation.
//!
//! A collection definition names a database and collection, declares the
//! field schema used to synthesise documents, and optionally carries a shard
//! key and secondary indexes:
//!
//! ```json
//! {
//!   "databaseName": "airline",
//!   "collectionName": "flights",
//!   "fieldName": {
//!     "flight_id": {"type": "int", "provider": "flight_id"},
//!     "seats_available": {"type": "int"}
//!   },
//!   "shardConfig": {"key": {"flight_id": 1}},
//!   "indexes": [{"keys": {"gate": 1}, "options": {"name": "gate_1"}}]
//! }
//! ```
//!
//! Object key order is significant for shard keys and compound indexes, so
//! those maps deserialise into [`OrderedMap`], which keeps source order.

use crate::types::FieldType;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Identity field MongoDB assigns when no other key is declared.
pub const DEFAULT_ID_FIELD: &str = "_id";

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error parsing JSON
    #[error("Failed to parse collection definition: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Definition is structurally invalid
    #[error("Invalid collection definition: {0}")]
    Invalid(String),
}

// ============================================================================
// Ordered maps
// ============================================================================

/// A JSON object deserialised as a list of entries in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Whether the map has an entry for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in source order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(OrderedMap(entries))
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

// ============================================================================
// Definitions
// ============================================================================

/// Sort direction or special index kind for one key of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyDirection {
    /// `1` or `-1`
    Order(i32),
    /// `"hashed"`, `"text"`, `"2dsphere"`, ...
    Kind(String),
}

/// Field schema entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Declared type (defaults to `string`)
    #[serde(default, rename = "type", alias = "bsonType")]
    pub field_type: FieldType,

    /// Named provider, takes precedence over the type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Explicit primary key marker
    #[serde(default)]
    pub is_primary_key: bool,

    /// Unique marker, also treated as a primary key hint
    #[serde(default)]
    pub unique: bool,
}

impl FieldDefinition {
    /// A field generated purely from its type.
    pub fn typed(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Self::default()
        }
    }

    /// A field generated by a named provider.
    pub fn with_provider(field_type: FieldType, provider: impl Into<String>) -> Self {
        Self {
            field_type,
            provider: Some(provider.into()),
            ..Self::default()
        }
    }
}

/// Shard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardConfig {
    /// Shard key fields in key order
    pub key: OrderedMap<KeyDirection>,
}

/// Secondary index declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Indexed fields in key order
    pub keys: OrderedMap<KeyDirection>,

    /// Driver index options (`unique`, `name`, `sparse`, ...)
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl IndexDefinition {
    /// Whether the index was declared unique.
    pub fn is_unique(&self) -> bool {
        self.options
            .get("unique")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// Database and collection pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Collection definition loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    /// Database name
    pub database_name: String,

    /// Base collection name (instances may add a `_<n>` suffix)
    pub collection_name: String,

    /// Field schema in declaration order
    #[serde(rename = "fieldName", default)]
    pub fields: OrderedMap<FieldDefinition>,

    /// Optional shard configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_config: Option<ShardConfig>,

    /// Optional index list
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl CollectionDefinition {
    /// Parse a single definition from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let def: Self = serde_json::from_str(json)?;
        def.validate()?;
        Ok(def)
    }

    /// Parse a JSON document holding either one definition or a list of them.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, SchemaError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<CollectionDefinition>),
            One(Box<CollectionDefinition>),
        }

        let defs = match serde_json::from_str::<OneOrMany>(json)? {
            OneOrMany::Many(defs) => defs,
            OneOrMany::One(def) => vec![*def],
        };
        for def in &defs {
            def.validate()?;
        }
        Ok(defs)
    }

    /// Check the required names are present.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.database_name.trim().is_empty() || self.collection_name.trim().is_empty() {
            return Err(SchemaError::Invalid(
                "'databaseName' and 'collectionName' must be provided".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the primary key field.
    ///
    /// A shard key field present in the schema wins, then the first field
    /// marked `isPrimaryKey` or `unique`, then `_id`.
    pub fn primary_key(&self) -> &str {
        if let Some(shard) = &self.shard_config {
            if let Some(key) = shard.key.keys().find(|k| self.fields.contains_key(k)) {
                return key;
            }
        }

        self.fields
            .iter()
            .find(|(_, def)| def.is_primary_key || def.unique)
            .map(|(name, _)| name)
            .unwrap_or(DEFAULT_ID_FIELD)
    }

    /// Shard key fields declared for this collection (empty when unsharded).
    pub fn shard_key_fields(&self) -> Vec<&str> {
        self.shard_config
            .as_ref()
            .map(|s| s.key.keys().collect())
            .unwrap_or_default()
    }

    /// Look up a field definition.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }

    /// Declared type of a field, `string` when the field is not declared.
    pub fn field_type(&self, name: &str) -> FieldType {
        self.field(name)
            .map(|f| f.field_type.clone())
            .unwrap_or_default()
    }

    /// All fields except the primary key, in declaration order.
    pub fn non_key_fields(&self) -> Vec<(&str, &FieldDefinition)> {
        let key = self.primary_key();
        self.fields.iter().filter(|(name, _)| *name != key).collect()
    }

    /// Collection names for `count` instances of this definition.
    ///
    /// A single instance keeps the base name; more instances are suffixed
    /// `_1`, `_2`, ...
    pub fn instance_names(&self, count: usize) -> Vec<String> {
        if count <= 1 {
            return vec![self.collection_name.clone()];
        }
        (1..=count)
            .map(|i| format!("{}_{i}", self.collection_name))
            .collect()
    }

    /// Namespace of the base collection.
    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.database_name, &self.collection_name)
    }
}
