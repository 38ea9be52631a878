//! Forward conversion: generated values and query specifications → BSON.
//!
//! Planner output stays typed until it reaches the store, where it is turned
//! into the BSON documents the driver expects.

use bson::oid::ObjectId;
use bson::{doc, Bson, DateTime as BsonDateTime, Decimal128, Document};
use workload_types::{
    Filter, GeneratedDocument, GeneratedValue, KeyDirection, OrderedMap, Predicate, Projection,
    UpdateOp,
};

/// Wrapper for BSON values that can be inserted into MongoDB.
#[derive(Debug, Clone, PartialEq)]
pub struct BsonValue(pub Bson);

impl BsonValue {
    /// Get the inner BSON value.
    pub fn into_inner(self) -> Bson {
        self.0
    }

    /// Get a reference to the inner BSON value.
    pub fn as_inner(&self) -> &Bson {
        &self.0
    }
}

impl From<GeneratedValue> for BsonValue {
    fn from(value: GeneratedValue) -> Self {
        match value {
            GeneratedValue::Null => BsonValue(Bson::Null),

            GeneratedValue::Bool(b) => BsonValue(Bson::Boolean(b)),

            GeneratedValue::Int32(i) => BsonValue(Bson::Int32(i)),
            GeneratedValue::Int64(i) => BsonValue(Bson::Int64(i)),

            GeneratedValue::Double(f) => BsonValue(Bson::Double(f)),

            // Decimal128 when the string parses, otherwise keep the text
            GeneratedValue::Decimal(s) => match s.parse::<Decimal128>() {
                Ok(d) => BsonValue(Bson::Decimal128(d)),
                Err(_) => BsonValue(Bson::String(s)),
            },

            GeneratedValue::String(s) => BsonValue(Bson::String(s)),

            GeneratedValue::DateTime(dt) => BsonValue(Bson::DateTime(BsonDateTime::from_chrono(dt))),

            GeneratedValue::ObjectId(bytes) => BsonValue(Bson::ObjectId(ObjectId::from_bytes(bytes))),

            GeneratedValue::Array(items) => BsonValue(Bson::Array(
                items
                    .into_iter()
                    .map(|v| BsonValue::from(v).into_inner())
                    .collect(),
            )),

            GeneratedValue::Object(map) => {
                let mut doc = Document::new();
                for (k, v) in map {
                    doc.insert(k, BsonValue::from(v).into_inner());
                }
                BsonValue(Bson::Document(doc))
            }
        }
    }
}

impl From<&GeneratedValue> for BsonValue {
    fn from(value: &GeneratedValue) -> Self {
        BsonValue::from(value.clone())
    }
}

/// Convert a generated document to a BSON document.
pub fn document_to_bson(document: GeneratedDocument) -> Document {
    let mut doc = Document::new();
    for (k, v) in document {
        doc.insert(k, BsonValue::from(v).into_inner());
    }
    doc
}

fn bson(value: &GeneratedValue) -> Bson {
    BsonValue::from(value).into_inner()
}

/// Convert one predicate to its BSON match expression.
pub fn predicate_to_bson(predicate: &Predicate) -> Bson {
    match predicate {
        Predicate::Eq(v) => bson(v),
        Predicate::Gt(v) => Bson::Document(doc! { "$gt": bson(v) }),
        Predicate::Lt(v) => Bson::Document(doc! { "$lt": bson(v) }),
        Predicate::Range { gte, lte } => Bson::Document(doc! { "$gte": bson(gte), "$lte": bson(lte) }),
        Predicate::Regex(pattern) => Bson::Document(doc! { "$regex": pattern.as_str() }),
        Predicate::In(values) => {
            let values: Vec<Bson> = values.iter().map(bson).collect();
            Bson::Document(doc! { "$in": values })
        }
        Predicate::Exists(exists) => Bson::Document(doc! { "$exists": *exists }),
    }
}

/// Convert a filter to a BSON query document.
pub fn filter_to_document(filter: &Filter) -> Document {
    let mut doc = Document::new();
    for (field, predicate) in filter.clauses() {
        doc.insert(field.as_str(), predicate_to_bson(predicate));
    }
    doc
}

/// Convert update operators to a BSON update document.
///
/// Operators of the same kind are merged: `[$set a, $set b]` becomes
/// `{$set: {a: .., b: ..}}`.
pub fn update_to_document(ops: &[UpdateOp]) -> Document {
    let mut doc = Document::new();
    for op in ops {
        let value = match op {
            UpdateOp::Set { value, .. } | UpdateOp::Push { value, .. } => bson(value),
            UpdateOp::Inc { delta, .. } => bson(delta),
        };
        match doc.get_mut(op.operator()) {
            Some(Bson::Document(fields)) => {
                fields.insert(op.field(), value);
            }
            _ => {
                let mut fields = Document::new();
                fields.insert(op.field(), value);
                doc.insert(op.operator(), fields);
            }
        }
    }
    doc
}

/// Convert an inclusion projection to a BSON projection document.
pub fn projection_to_document(projection: &Projection) -> Document {
    let mut doc = Document::new();
    for field in projection.fields() {
        doc.insert(field.as_str(), 1);
    }
    doc
}

/// Convert a shard key or index key specification, keeping field order.
pub fn key_spec_to_document(keys: &OrderedMap<KeyDirection>) -> Document {
    let mut doc = Document::new();
    for (field, direction) in keys.iter() {
        let value = match direction {
            KeyDirection::Order(order) => Bson::Int32(*order),
            KeyDirection::Kind(kind) => Bson::String(kind.clone()),
        };
        doc.insert(field, value);
    }
    doc
}
