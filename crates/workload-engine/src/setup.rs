//! Collection setup before the workload starts.
//!
//! For every definition and instance: drop when recreating, create when
//! missing, shard on a sharded cluster when the definition carries a
//! `shardConfig`, then create the declared indexes. Failures are logged per
//! collection and setup moves on.

use crate::store::{IndexSpec, WorkloadStore};
use bson::Document;
use mongodb_types::key_spec_to_document;
use std::sync::Arc;
use tracing::{error, info, warn};
use workload_types::{CollectionDefinition, IndexDefinition, KeyDirection, Namespace, OrderedMap};

/// Options for [`prepare_collections`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupOptions {
    /// Instances per definition.
    pub instances: usize,
    /// Drop existing collections first.
    pub recreate: bool,
}

/// What setup found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    /// Whether the deployment is a sharded cluster.
    pub sharded_cluster: bool,
    /// Every namespace the workload may target.
    pub namespaces: Vec<Namespace>,
    /// Namespaces sharded during this setup.
    pub sharded: Vec<Namespace>,
}

/// Index keys with the shard key fields first.
///
/// Shard key fields already present in the index keep the shard key's
/// position and direction.
pub fn prepend_shard_key(
    index: &OrderedMap<KeyDirection>,
    shard_key: &OrderedMap<KeyDirection>,
) -> OrderedMap<KeyDirection> {
    shard_key
        .iter()
        .chain(index.iter().filter(|(field, _)| !shard_key.contains_key(field)))
        .map(|(field, direction)| (field.to_string(), direction.clone()))
        .collect()
}

fn index_options(index: &IndexDefinition) -> Option<Document> {
    match bson::to_document(&index.options) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!("Ignoring index options {:?}: {e}", index.options);
            None
        }
    }
}

/// Create, shard and index every collection instance.
pub async fn prepare_collections<S: WorkloadStore + ?Sized>(
    store: &S,
    definitions: &[Arc<CollectionDefinition>],
    options: SetupOptions,
) -> SetupReport {
    let sharded_cluster = match store.is_sharded_cluster().await {
        Ok(sharded) => sharded,
        Err(e) => {
            warn!("Could not determine the deployment topology, assuming a replica set: {e}");
            false
        }
    };
    let mut report = SetupReport {
        sharded_cluster,
        ..SetupReport::default()
    };

    for def in definitions {
        for name in def.instance_names(options.instances) {
            let ns = Namespace::new(&def.database_name, name);
            prepare_one(store, def, &ns, options.recreate, &mut report).await;
            report.namespaces.push(ns);
        }
    }

    report
}

async fn prepare_one<S: WorkloadStore + ?Sized>(
    store: &S,
    def: &CollectionDefinition,
    ns: &Namespace,
    recreate: bool,
    report: &mut SetupReport,
) {
    if recreate {
        match store.drop_collection(ns).await {
            Ok(()) => info!("Dropped collection '{ns}'"),
            Err(e) => error!("Error dropping collection '{ns}': {e}"),
        }
    }

    match store.create_collection(ns).await {
        Ok(true) => info!("Collection '{}' created in DB '{}'", ns.collection, ns.database),
        Ok(false) => {
            info!("Collection '{ns}' already exists");
            return;
        }
        Err(e) => {
            error!("Error creating collection '{ns}': {e}");
            return;
        }
    }

    let shard_key = match &def.shard_config {
        Some(shard) if report.sharded_cluster && !shard.key.is_empty() => {
            let key = key_spec_to_document(&shard.key);
            let sharded = async {
                store
                    .create_index(
                        ns,
                        IndexSpec {
                            keys: key.clone(),
                            options: Document::new(),
                        },
                    )
                    .await?;
                store.shard_collection(ns, key.clone()).await
            }
            .await;
            match sharded {
                Ok(()) => {
                    info!("Sharding configured for '{ns}' with key {key}");
                    report.sharded.push(ns.clone());
                    Some(&shard.key)
                }
                Err(e) => {
                    error!("Error sharding collection '{ns}': {e}");
                    None
                }
            }
        }
        _ => None,
    };

    for index in &def.indexes {
        let keys = match shard_key {
            Some(shard_key) => prepend_shard_key(&index.keys, shard_key),
            None => index.keys.clone(),
        };
        let keys = key_spec_to_document(&keys);
        let Some(options) = index_options(index) else {
            continue;
        };
        match store
            .create_index(
                ns,
                IndexSpec {
                    keys: keys.clone(),
                    options,
                },
            )
            .await
        {
            Ok(()) => info!("Successfully created index {keys} on '{ns}'"),
            Err(e) => error!("Failed to create index {keys} on '{ns}': {e}"),
        }
    }
}
