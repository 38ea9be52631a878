//! Reverse conversion: BSON → generated values.
//!
//! Used for driver-returned values that flow back into the workload, such
//! as the `_id`s assigned on insert that feed the key cache.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use workload_types::GeneratedValue;

/// Convert a BSON value to a generated value.
///
/// BSON kinds without a generated counterpart (binary, regex, code, ...)
/// become their relaxed extended JSON string.
pub fn bson_to_generated(value: &Bson) -> GeneratedValue {
    match value {
        Bson::Null | Bson::Undefined => GeneratedValue::Null,
        Bson::Boolean(b) => GeneratedValue::Bool(*b),
        Bson::Int32(i) => GeneratedValue::Int32(*i),
        Bson::Int64(i) => GeneratedValue::Int64(*i),
        Bson::Double(f) => GeneratedValue::Double(*f),
        Bson::Decimal128(d) => GeneratedValue::Decimal(d.to_string()),
        Bson::String(s) => GeneratedValue::String(s.clone()),
        Bson::ObjectId(oid) => GeneratedValue::ObjectId(oid.bytes()),
        Bson::DateTime(dt) => GeneratedValue::DateTime(dt.to_chrono()),
        Bson::Timestamp(ts) => GeneratedValue::DateTime(
            DateTime::<Utc>::from_timestamp(i64::from(ts.time), 0).unwrap_or_default(),
        ),
        Bson::Array(items) => GeneratedValue::Array(items.iter().map(bson_to_generated).collect()),
        Bson::Document(doc) => GeneratedValue::Object(document_to_generated(doc)),
        other => GeneratedValue::String(other.clone().into_relaxed_extjson().to_string()),
    }
}

/// Convert a BSON document to a generated field map.
pub fn document_to_generated(doc: &Document) -> BTreeMap<String, GeneratedValue> {
    doc.iter()
        .map(|(k, v)| (k.clone(), bson_to_generated(v)))
        .collect()
}
