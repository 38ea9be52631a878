//! In-memory `WorkloadStore` for engine tests.
//!
//! Supports the filter and update operators the planner emits: equality,
//! `$gt`, `$lt`, `$gte`, `$lte`, `$in`, `$exists`, anchored-prefix `$regex`,
//! `$set`, `$inc` and `$push`.

#![allow(dead_code)]

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use workload_engine::{
    CollectionStats, IndexSpec, ShardMetadata, StoreError, UpdateOutcome, WorkloadStore,
};
use workload_types::{CollectionDefinition, Namespace};

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Namespace, Vec<Document>>>,
    shard_meta: Mutex<HashMap<Namespace, ShardMetadata>>,
    indexes: Mutex<HashMap<Namespace, Vec<Document>>>,
    calls: Mutex<Vec<String>>,
    sharded_cluster: bool,
    failing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports itself as a mongos.
    pub fn sharded_cluster() -> Self {
        Self {
            sharded_cluster: true,
            ..Self::default()
        }
    }

    /// A store whose every data call fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_shard_metadata(self, ns: &Namespace, meta: ShardMetadata) -> Self {
        self.shard_meta.lock().unwrap().insert(ns.clone(), meta);
        self
    }

    pub fn documents(&self, ns: &Namespace) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(ns)
            .cloned()
            .unwrap_or_default()
    }

    pub fn len(&self, ns: &Namespace) -> usize {
        self.documents(ns).len()
    }

    pub fn indexes(&self, ns: &Namespace) -> Vec<Document> {
        self.indexes
            .lock()
            .unwrap()
            .get(ns)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn call(&self, name: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(name.to_string());
        if self.failing {
            return Err(StoreError::Unavailable(format!("{name} failed")));
        }
        Ok(())
    }
}

pub fn definition(json: &str) -> Arc<CollectionDefinition> {
    Arc::new(CollectionDefinition::from_json(json).unwrap())
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        Bson::Decimal128(d) => d.to_string().parse().ok(),
        _ => None,
    }
}

fn compare(value: &Bson, arg: &Bson) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (number(value), number(arg)) {
        return a.partial_cmp(&b);
    }
    match (value, arg) {
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn equals(value: &Bson, expected: &Bson) -> bool {
    value == expected || compare(value, expected) == Some(Ordering::Equal)
}

fn field_equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        Some(Bson::Array(items)) => {
            items.iter().any(|item| equals(item, expected))
                || &Bson::Array(items.clone()) == expected
        }
        Some(value) => equals(value, expected),
        None => *expected == Bson::Null,
    }
}

fn regex_prefix(pattern: &str) -> Option<String> {
    let body = pattern.strip_prefix('^')?;
    let mut prefix = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            prefix.extend(chars.next());
        } else {
            prefix.push(c);
        }
    }
    Some(prefix)
}

fn apply_operator(op: &str, value: Option<&Bson>, arg: &Bson) -> bool {
    let ordered = |wanted: &[Ordering]| {
        value
            .and_then(|v| compare(v, arg))
            .is_some_and(|o| wanted.contains(&o))
    };
    match op {
        "$exists" => value.is_some() == arg.as_bool().unwrap_or(true),
        "$gt" => ordered(&[Ordering::Greater]),
        "$gte" => ordered(&[Ordering::Greater, Ordering::Equal]),
        "$lt" => ordered(&[Ordering::Less]),
        "$lte" => ordered(&[Ordering::Less, Ordering::Equal]),
        "$in" => arg
            .as_array()
            .is_some_and(|items| items.iter().any(|item| field_equals(value, item))),
        "$regex" => match (value, arg) {
            (Some(Bson::String(s)), Bson::String(pattern)) => {
                regex_prefix(pattern).is_some_and(|prefix| s.starts_with(&prefix))
            }
            _ => false,
        },
        _ => false,
    }
}

pub fn matches(doc: &Document, filter: &Document) -> bool {
    filter.iter().all(|(field, condition)| {
        let value = doc.get(field);
        match condition {
            Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
                ops.iter().all(|(op, arg)| apply_operator(op, value, arg))
            }
            expected => field_equals(value, expected),
        }
    })
}

fn apply_update(doc: &mut Document, update: &Document) -> bool {
    let before = doc.clone();
    for (op, fields) in update {
        let Bson::Document(fields) = fields else {
            continue;
        };
        for (field, arg) in fields {
            match op.as_str() {
                "$set" => {
                    doc.insert(field, arg.clone());
                }
                "$inc" => {
                    let updated = match (doc.get(field), arg) {
                        (Some(Bson::Int32(a)), Bson::Int32(b)) => Bson::Int32(a + b),
                        (Some(Bson::Int64(a)), Bson::Int64(b)) => Bson::Int64(a + b),
                        (Some(current), delta) => Bson::Double(
                            number(current).unwrap_or(0.0) + number(delta).unwrap_or(0.0),
                        ),
                        (None, delta) => delta.clone(),
                    };
                    doc.insert(field, updated);
                }
                "$push" => match doc.get_mut(field) {
                    Some(Bson::Array(items)) => items.push(arg.clone()),
                    _ => {
                        doc.insert(field, Bson::Array(vec![arg.clone()]));
                    }
                },
                _ => {}
            }
        }
    }
    *doc != before
}

#[async_trait]
impl WorkloadStore for MemoryStore {
    async fn insert_many(&self, ns: &Namespace, docs: Vec<Document>) -> Result<Vec<Bson>, StoreError> {
        self.call("insert_many")?;
        let mut collections = self.collections.lock().unwrap();
        let collection = collections.entry(ns.clone()).or_default();
        let mut ids = Vec::with_capacity(docs.len());
        for mut doc in docs {
            if !doc.contains_key("_id") {
                doc.insert("_id", ObjectId::new());
            }
            ids.push(doc.get("_id").cloned().unwrap_or(Bson::Null));
            collection.push(doc);
        }
        Ok(ids)
    }

    async fn insert_one(&self, ns: &Namespace, doc: Document) -> Result<Bson, StoreError> {
        self.call("insert_one")?;
        let mut doc = doc;
        if !doc.contains_key("_id") {
            doc.insert("_id", ObjectId::new());
        }
        let id = doc.get("_id").cloned().unwrap_or(Bson::Null);
        self.collections
            .lock()
            .unwrap()
            .entry(ns.clone())
            .or_default()
            .push(doc);
        Ok(id)
    }

    async fn find(
        &self,
        ns: &Namespace,
        filter: Document,
        _projection: Option<Document>,
        limit: Option<i64>,
    ) -> Result<u64, StoreError> {
        self.call("find")?;
        let found = self
            .documents(ns)
            .iter()
            .filter(|doc| matches(doc, &filter))
            .count() as u64;
        Ok(match limit {
            Some(limit) if limit > 0 => found.min(limit as u64),
            _ => found,
        })
    }

    async fn count(&self, ns: &Namespace, filter: Document) -> Result<u64, StoreError> {
        self.call("count")?;
        Ok(self
            .documents(ns)
            .iter()
            .filter(|doc| matches(doc, &filter))
            .count() as u64)
    }

    async fn update(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
        multi: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        self.call(if multi { "update_many" } else { "update_one" })?;
        let mut collections = self.collections.lock().unwrap();
        let mut outcome = UpdateOutcome::default();
        if let Some(collection) = collections.get_mut(ns) {
            for doc in collection.iter_mut().filter(|doc| matches(doc, &filter)) {
                outcome.matched += 1;
                if apply_update(doc, &update) {
                    outcome.modified += 1;
                }
                if !multi {
                    break;
                }
            }
        }
        Ok(outcome)
    }

    async fn delete(&self, ns: &Namespace, filter: Document, multi: bool) -> Result<u64, StoreError> {
        self.call(if multi { "delete_many" } else { "delete_one" })?;
        let mut collections = self.collections.lock().unwrap();
        let Some(collection) = collections.get_mut(ns) else {
            return Ok(0);
        };
        if multi {
            let before = collection.len();
            collection.retain(|doc| !matches(doc, &filter));
            Ok((before - collection.len()) as u64)
        } else {
            match collection.iter().position(|doc| matches(doc, &filter)) {
                Some(pos) => {
                    collection.remove(pos);
                    Ok(1)
                }
                None => Ok(0),
            }
        }
    }

    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<Document>) -> Result<u64, StoreError> {
        self.call("aggregate")?;
        let filter = pipeline
            .iter()
            .find_map(|stage| stage.get_document("$match").ok().cloned())
            .unwrap_or_default();
        Ok(self
            .documents(ns)
            .iter()
            .filter(|doc| matches(doc, &filter))
            .count() as u64)
    }

    async fn shard_metadata(&self, ns: &Namespace) -> Result<ShardMetadata, StoreError> {
        Ok(self
            .shard_meta
            .lock()
            .unwrap()
            .get(ns)
            .cloned()
            .unwrap_or_default())
    }

    async fn collection_stats(&self, ns: &Namespace) -> Result<CollectionStats, StoreError> {
        let docs = self.documents(ns);
        let size_bytes = docs
            .iter()
            .map(|doc| bson::to_vec(doc).map(|bytes| bytes.len() as u64).unwrap_or(0))
            .sum();
        let sharded = self
            .shard_meta
            .lock()
            .unwrap()
            .get(ns)
            .is_some_and(|meta| meta.is_sharded);
        Ok(CollectionStats {
            namespace: ns.to_string(),
            sharded,
            size_bytes,
            documents: docs.len() as u64,
        })
    }

    async fn is_sharded_cluster(&self) -> Result<bool, StoreError> {
        Ok(self.sharded_cluster)
    }

    async fn drop_collection(&self, ns: &Namespace) -> Result<(), StoreError> {
        self.call("drop")?;
        self.collections.lock().unwrap().remove(ns);
        self.indexes.lock().unwrap().remove(ns);
        Ok(())
    }

    async fn create_collection(&self, ns: &Namespace) -> Result<bool, StoreError> {
        self.call("create")?;
        let mut collections = self.collections.lock().unwrap();
        if collections.contains_key(ns) {
            return Ok(false);
        }
        collections.insert(ns.clone(), Vec::new());
        Ok(true)
    }

    async fn create_index(&self, ns: &Namespace, index: IndexSpec) -> Result<(), StoreError> {
        self.call("create_index")?;
        self.indexes
            .lock()
            .unwrap()
            .entry(ns.clone())
            .or_default()
            .push(index.keys);
        Ok(())
    }

    async fn shard_collection(&self, ns: &Namespace, key: Document) -> Result<(), StoreError> {
        self.call("shard")?;
        let meta = ShardMetadata::sharded(key.keys().cloned());
        self.shard_meta.lock().unwrap().insert(ns.clone(), meta);
        Ok(())
    }
}
