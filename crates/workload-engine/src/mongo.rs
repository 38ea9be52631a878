//! MongoDB implementation of [`WorkloadStore`].

use crate::guard::ShardMetadata;
use crate::store::{CollectionStats, IndexSpec, StoreError, UpdateOutcome, WorkloadStore};
use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOptions, IndexOptions};
use mongodb::{Client, Collection, Cursor, IndexModel};
use tokio::sync::OnceCell;
use tracing::debug;
use workload_types::Namespace;

const APP_NAME: &str = "mongodb-workload";

/// `hello` reply message of a mongos router.
const MONGOS_MSG: &str = "isdbgrid";

/// MongoDB store owning one driver client.
///
/// A lazily constructed store connects on first use, so each worker group
/// opens its own client inside its own tasks.
pub struct MongoStore {
    uri: String,
    client: OnceCell<Client>,
}

impl MongoStore {
    /// Create a store that connects on first use.
    pub fn lazy(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            client: OnceCell::new(),
        }
    }

    /// Connect and ping the deployment.
    pub async fn connect(uri: impl Into<String>) -> Result<Self, StoreError> {
        let store = Self::lazy(uri);
        let client = store.client().await?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(store)
    }

    async fn client(&self) -> Result<&Client, StoreError> {
        self.client
            .get_or_try_init(|| async {
                let mut options = ClientOptions::parse(self.uri.as_str()).await?;
                options.app_name = Some(APP_NAME.to_string());
                let client = Client::with_options(options)?;
                debug!("Opened MongoDB client");
                Ok::<_, StoreError>(client)
            })
            .await
    }

    async fn collection(&self, ns: &Namespace) -> Result<Collection<Document>, StoreError> {
        Ok(self
            .client()
            .await?
            .database(&ns.database)
            .collection(&ns.collection))
    }
}

async fn drain(mut cursor: Cursor<Document>) -> Result<u64, StoreError> {
    let mut count = 0;
    while cursor.try_next().await?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Read a numeric field that the server may encode as any BSON number.
fn number(doc: &Document, key: &str) -> u64 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Int64(v)) => u64::try_from(*v).unwrap_or(0),
        Some(Bson::Double(v)) if *v > 0.0 => *v as u64,
        _ => 0,
    }
}

#[async_trait]
impl WorkloadStore for MongoStore {
    async fn insert_many(&self, ns: &Namespace, docs: Vec<Document>) -> Result<Vec<Bson>, StoreError> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let result = self.collection(ns).await?.insert_many(docs).await?;
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids.into_iter().map(|(_, id)| id).collect())
    }

    async fn insert_one(&self, ns: &Namespace, doc: Document) -> Result<Bson, StoreError> {
        let result = self.collection(ns).await?.insert_one(doc).await?;
        Ok(result.inserted_id)
    }

    async fn find(
        &self,
        ns: &Namespace,
        filter: Document,
        projection: Option<Document>,
        limit: Option<i64>,
    ) -> Result<u64, StoreError> {
        let options = FindOptions::builder()
            .projection(projection)
            .limit(limit)
            .build();
        let cursor = self
            .collection(ns)
            .await?
            .find(filter)
            .with_options(options)
            .await?;
        drain(cursor).await
    }

    async fn count(&self, ns: &Namespace, filter: Document) -> Result<u64, StoreError> {
        Ok(self.collection(ns).await?.count_documents(filter).await?)
    }

    async fn update(
        &self,
        ns: &Namespace,
        filter: Document,
        update: Document,
        multi: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let collection = self.collection(ns).await?;
        let result = if multi {
            collection.update_many(filter, update).await?
        } else {
            collection.update_one(filter, update).await?
        };
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete(&self, ns: &Namespace, filter: Document, multi: bool) -> Result<u64, StoreError> {
        let collection = self.collection(ns).await?;
        let result = if multi {
            collection.delete_many(filter).await?
        } else {
            collection.delete_one(filter).await?
        };
        Ok(result.deleted_count)
    }

    async fn aggregate(&self, ns: &Namespace, pipeline: Vec<Document>) -> Result<u64, StoreError> {
        let cursor = self.collection(ns).await?.aggregate(pipeline).await?;
        drain(cursor).await
    }

    async fn shard_metadata(&self, ns: &Namespace) -> Result<ShardMetadata, StoreError> {
        let entry = self
            .client()
            .await?
            .database("config")
            .collection::<Document>("collections")
            .find_one(doc! { "_id": ns.to_string() })
            .await?;

        let Some(entry) = entry else {
            return Ok(ShardMetadata::unsharded());
        };
        if entry.get_bool("unsplittable").unwrap_or(false) {
            return Ok(ShardMetadata::unsharded());
        }
        match entry.get_document("key") {
            Ok(key) => Ok(ShardMetadata::sharded(key.keys().cloned())),
            Err(_) => Ok(ShardMetadata::unsharded()),
        }
    }

    async fn collection_stats(&self, ns: &Namespace) -> Result<CollectionStats, StoreError> {
        let stats = self
            .client()
            .await?
            .database(&ns.database)
            .run_command(doc! { "collStats": ns.collection.as_str() })
            .await?;
        Ok(CollectionStats {
            namespace: ns.to_string(),
            sharded: stats.get_bool("sharded").unwrap_or(false),
            size_bytes: number(&stats, "size"),
            documents: number(&stats, "count"),
        })
    }

    async fn is_sharded_cluster(&self) -> Result<bool, StoreError> {
        let hello = self
            .client()
            .await?
            .database("admin")
            .run_command(doc! { "hello": 1 })
            .await?;
        Ok(hello.get_str("msg").map(|m| m == MONGOS_MSG).unwrap_or(false))
    }

    async fn drop_collection(&self, ns: &Namespace) -> Result<(), StoreError> {
        self.collection(ns).await?.drop().await?;
        Ok(())
    }

    async fn create_collection(&self, ns: &Namespace) -> Result<bool, StoreError> {
        let database = self.client().await?.database(&ns.database);
        let existing = database.list_collection_names().await?;
        if existing.iter().any(|name| name == &ns.collection) {
            return Ok(false);
        }
        database.create_collection(&ns.collection).await?;
        Ok(true)
    }

    async fn create_index(&self, ns: &Namespace, index: IndexSpec) -> Result<(), StoreError> {
        let options = if index.options.is_empty() {
            None
        } else {
            Some(bson::from_document::<IndexOptions>(index.options)?)
        };
        let model = IndexModel::builder()
            .keys(index.keys)
            .options(options)
            .build();
        self.collection(ns).await?.create_index(model).await?;
        Ok(())
    }

    async fn shard_collection(&self, ns: &Namespace, key: Document) -> Result<(), StoreError> {
        let admin = self.client().await?.database("admin");
        admin
            .run_command(doc! { "enableSharding": ns.database.as_str() })
            .await?;
        admin
            .run_command(doc! { "shardCollection": ns.to_string(), "key": key })
            .await?;
        Ok(())
    }
}
