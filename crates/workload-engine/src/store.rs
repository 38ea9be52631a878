//! Store boundary used by handlers, the replayer and collection setup.

use crate::guard::ShardMetadata;
use async_trait::async_trait;
use bson::{Bson, Document};
use thiserror::Error;
use workload_types::Namespace;

/// Errors raised at the store boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    /// MongoDB connection or query error.
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    /// BSON decoding error.
    #[error("BSON error: {0}")]
    Bson(#[from] bson::de::Error),

    /// The store cannot serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an update call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Size and sharding facts for one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionStats {
    pub namespace: String,
    pub sharded: bool,
    pub size_bytes: u64,
    pub documents: u64,
}

/// Index to create during collection setup.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub keys: Document,
    pub options: Document,
}

/// Operations the workload performs against a document store.
///
/// The MongoDB implementation lives in [`crate::mongo`]; tests use an
/// in-memory double.
#[async_trait]
pub trait WorkloadStore: Send + Sync {
    /// Insert documents, returning the stored `_id` of each.
    async fn insert_many(&self, ns: &Namespace, docs: Vec<Document>) -> Result<Vec<Bson>, StoreError>;

    /// Insert one document, returning its stored `_id`.
    async fn insert_one(&self, ns: &Namespace, doc: Document) -> Result<Bson, StoreError>;

    /// Run a find and return the number of documents read.
    async fn find(
        &self,
        ns: &Namespace,
        filter: Document,
        projection: Option<Document>,
        limit: Option<i64>,
    ) -> Result<u64, StoreError>;

    async fn count(&self, ns: &Namespace, filter: Document) -> Result<u64, StoreError>;

    /// Update one (`multi == false`) or every matching document.
    async fn update(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
        multi: bool,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Delete one (`multi == false`) or every matching document.
    async fn delete(&self, ns: &Namespace, filter: Document, multi: bool) -> Result<u64, StoreError>;

    /// Run a pipeline and return the number of result documents.
    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<Document>) -> Result<u64, StoreError>;

    async fn shard_metadata(&self, ns: &Namespace) -> Result<ShardMetadata, StoreError>;

    async fn collection_stats(&self, ns: &Namespace) -> Result<CollectionStats, StoreError>;

    /// Whether the deployment is a sharded cluster (reached through mongos).
    async fn is_sharded_cluster(&self) -> Result<bool, StoreError>;

    async fn drop_collection(&self, ns: &Namespace) -> Result<(), StoreError>;

    /// Create the collection, returning `false` when it already exists.
    async fn create_collection(&self, ns: &Namespace) -> Result<bool, StoreError>;

    async fn create_index(&self, ns: &Namespace, index: IndexSpec) -> Result<(), StoreError>;

    /// Enable sharding on the database and shard the collection on `key`.
    async fn shard_collection(&self, ns: &Namespace, key: Document) -> Result<(), StoreError>;
}
