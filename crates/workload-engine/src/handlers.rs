//! Insert, select, update and delete handlers.
//!
//! Each handler plans one operation against a [`CollectionTarget`], runs it
//! through the store and records the result in the group's
//! [`WorkerSharedState`]. Driver errors are logged and counted as an
//! attempted operation with zero documents. Guard vetoes and configuration
//! problems are skipped without counting.

use crate::guard::{assess, modifies_shard_key, GuardDecision, ShardMetadata};
use crate::planner::{plan_delete, plan_select, plan_update, FieldSample};
use crate::state::WorkerSharedState;
use crate::store::WorkloadStore;
use crate::target::CollectionTarget;
use mongodb_types::{
    bson_to_generated, document_to_bson, filter_to_document, projection_to_document,
    update_to_document,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, error, warn};
use workload_generator::{generate_for_type, DocumentGenerator, GenerationContext};
use workload_types::{GeneratedValue, OperationKind, QueryMode, DEFAULT_ID_FIELD};

/// Documents read by an ineffective select.
pub const FIND_LIMIT: i64 = 5;

/// Upper bound on the number of fields one update touches.
pub const MAX_UPDATE_FIELDS: usize = 5;

/// What happened to one dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store call succeeded.
    Completed { docs: u64 },
    /// The store call failed; counted with zero documents.
    Failed,
    /// Nothing was sent to the store.
    Skipped,
}

impl Outcome {
    pub fn is_counted(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

/// Runs generated operations for one worker group.
pub struct OperationHandler<S> {
    store: Arc<S>,
    state: Arc<WorkerSharedState>,
    generator: Arc<DocumentGenerator>,
    batch_size: usize,
    mode: QueryMode,
}

impl<S: WorkloadStore> OperationHandler<S> {
    pub fn new(
        store: Arc<S>,
        state: Arc<WorkerSharedState>,
        generator: Arc<DocumentGenerator>,
        batch_size: usize,
        mode: QueryMode,
    ) -> Self {
        Self {
            store,
            state,
            generator,
            batch_size: batch_size.max(1),
            mode,
        }
    }

    pub fn state(&self) -> &Arc<WorkerSharedState> {
        &self.state
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Dispatch one operation of `kind`.
    pub async fn run(&self, kind: OperationKind, target: &CollectionTarget, rng: &mut StdRng) -> Outcome {
        match kind {
            OperationKind::Insert => self.insert(target, rng).await,
            OperationKind::Select => self.select(target, rng).await,
            OperationKind::Update => self.update(target, rng).await,
            OperationKind::Delete => self.delete(target, rng).await,
        }
    }

    /// Insert one batch of generated documents.
    pub async fn insert(&self, target: &CollectionTarget, rng: &mut StdRng) -> Outcome {
        let ns = &target.namespace;
        let key = target.primary_key.as_str();

        let docs: Vec<_> = (0..self.batch_size)
            .map(|_| {
                self.generator
                    .generate_for_insert(&target.definition, key, target.needs_context, rng)
            })
            .collect();
        let generated_keys: Vec<GeneratedValue> = if key == DEFAULT_ID_FIELD {
            Vec::new()
        } else {
            docs.iter().filter_map(|doc| doc.get(key).cloned()).collect()
        };
        let docs = docs.into_iter().map(document_to_bson).collect();

        match self.store.insert_many(ns, docs).await {
            Ok(ids) => {
                let inserted = ids.len() as u64;
                let keys = if key == DEFAULT_ID_FIELD {
                    ids.iter().map(bson_to_generated).collect()
                } else {
                    generated_keys
                };
                self.state.record_insert(ns, inserted, keys);
                debug!("Inserted {inserted} documents into {ns}");
                Outcome::Completed { docs: inserted }
            }
            Err(e) => {
                error!("Error inserting documents into {ns}: {e}");
                self.state.record(OperationKind::Insert, 0);
                Outcome::Failed
            }
        }
    }

    /// Run one planned read.
    pub async fn select(&self, target: &CollectionTarget, rng: &mut StdRng) -> Outcome {
        let ns = &target.namespace;
        let key = target.primary_key.as_str();
        let key_value = self.key_value(target, rng);
        let samples = self.samples(target, rng);
        let plan = plan_select(key, &key_value, &samples, rng);

        let result = if self.mode.is_optimized() {
            let Some(query) = plan.optimized.choose(rng) else {
                warn!("No select queries generated for {ns}");
                return Outcome::Skipped;
            };
            let meta = self.shard_metadata(target).await;
            if let GuardDecision::Skip { missing } =
                assess(OperationKind::Select, self.mode, &query.filter, &[], &meta)
            {
                debug!("Skipping select on sharded collection {ns}: query missing shard keys {missing:?}");
                return Outcome::Skipped;
            }
            self.store
                .count(ns, filter_to_document(&query.filter))
                .await
        } else {
            let Some(query) = plan.ineffective.choose(rng) else {
                warn!("No select queries generated for {ns}");
                return Outcome::Skipped;
            };
            self.store
                .find(
                    ns,
                    filter_to_document(&query.filter),
                    Some(projection_to_document(&query.projection)),
                    Some(FIND_LIMIT),
                )
                .await
        };

        match result {
            Ok(docs) => {
                self.state.record(OperationKind::Select, docs);
                Outcome::Completed { docs }
            }
            Err(e) => {
                error!("Error selecting from collection {ns} ({key}={key_value}): {e}");
                self.state.record(OperationKind::Select, 0);
                Outcome::Failed
            }
        }
    }

    /// Update one to five random non-key fields.
    pub async fn update(&self, target: &CollectionTarget, rng: &mut StdRng) -> Outcome {
        let ns = &target.namespace;
        let key = target.primary_key.as_str();
        let key_value = self.key_value(target, rng);

        let fields = target.definition.non_key_fields();
        if fields.is_empty() {
            warn!("No updateable fields found for {ns}");
            return Outcome::Skipped;
        }
        let count = rng.gen_range(1..=fields.len().min(MAX_UPDATE_FIELDS));
        let selected: Vec<_> = fields.choose_multiple(rng, count).copied().collect();

        let ctx = self
            .generator
            .fields_require_context(selected.iter().copied())
            .then(|| GenerationContext::random(rng));
        let samples: Vec<FieldSample> = selected
            .iter()
            .map(|(name, def)| {
                let value = self.generator.generate_field(name, def, ctx.as_ref(), rng);
                FieldSample::new(*name, value, def.field_type.clone())
            })
            .collect();

        let plan = plan_update(key, &key_value, &samples, rng);
        let candidates = if self.mode.is_optimized() {
            &plan.optimized
        } else {
            &plan.ineffective
        };
        let Some(query) = candidates.choose(rng) else {
            warn!("No update queries generated for {ns}");
            return Outcome::Skipped;
        };

        let meta = self.shard_metadata(target).await;
        if let GuardDecision::Skip { missing } =
            assess(OperationKind::Update, self.mode, &query.filter, &query.ops, &meta)
        {
            debug!("Skipping update on {ns}: shard key modified without full shard key filter, missing {missing:?}");
            return Outcome::Skipped;
        }

        let single = self.mode.is_optimized() || modifies_shard_key(&query.ops, &meta);
        let result = self
            .store
            .update(
                ns,
                filter_to_document(&query.filter),
                update_to_document(&query.ops),
                !single,
            )
            .await;

        match result {
            Ok(outcome) => {
                self.state.record(OperationKind::Update, outcome.modified);
                Outcome::Completed {
                    docs: outcome.modified,
                }
            }
            Err(e) => {
                error!("Error updating document {key}={key_value} in {ns}: {e}");
                self.state.record(OperationKind::Update, 0);
                Outcome::Failed
            }
        }
    }

    /// Delete by a planned filter.
    ///
    /// Optimized mode deletes one document and is shard-guarded; ineffective
    /// mode deletes every match.
    pub async fn delete(&self, target: &CollectionTarget, rng: &mut StdRng) -> Outcome {
        let ns = &target.namespace;
        let key = target.primary_key.as_str();
        let key_value = self.key_value(target, rng);
        let samples = self.samples(target, rng);
        let plan = plan_delete(key, &key_value, &samples, rng);

        let optimized = self.mode.is_optimized();
        let candidates = if optimized {
            &plan.optimized
        } else {
            &plan.ineffective
        };
        let Some(filter) = candidates.choose(rng) else {
            warn!("No delete queries generated for {ns}");
            return Outcome::Skipped;
        };

        if optimized {
            let meta = self.shard_metadata(target).await;
            if let GuardDecision::Skip { missing } =
                assess(OperationKind::Delete, self.mode, filter, &[], &meta)
            {
                debug!("Skipping delete_one on sharded collection {ns}: query missing shard key fields {missing:?}");
                return Outcome::Skipped;
            }
        }

        match self
            .store
            .delete(ns, filter_to_document(filter), !optimized)
            .await
        {
            Ok(deleted) => {
                self.state.record(OperationKind::Delete, deleted);
                if deleted > 0
                    && filter.equality_value(key) == Some(&key_value)
                    && self.state.remove_key_once(ns, &key_value)
                {
                    debug!("Removed {key}={key_value} from the key cache of {ns}");
                }
                Outcome::Completed { docs: deleted }
            }
            Err(e) => {
                error!("Error deleting from {ns} ({key}={key_value}): {e}");
                self.state.record(OperationKind::Delete, 0);
                Outcome::Failed
            }
        }
    }

    /// A cached key, or a freshly generated one when the cache is empty.
    fn key_value(&self, target: &CollectionTarget, rng: &mut StdRng) -> GeneratedValue {
        if let Some(value) = self.state.sample_key(&target.namespace, rng) {
            return value;
        }
        let key = target.primary_key.as_str();
        match target.definition.field(key) {
            Some(def) => self.generator.generate_field(key, def, None, rng),
            None => generate_for_type(&target.definition.field_type(key), rng),
        }
    }

    /// One sampled value per non-key field.
    fn samples(&self, target: &CollectionTarget, rng: &mut StdRng) -> Vec<FieldSample> {
        target
            .definition
            .non_key_fields()
            .into_iter()
            .map(|(name, def)| {
                let value = self.generator.generate_field(name, def, None, rng);
                FieldSample::new(name, value, def.field_type.clone())
            })
            .collect()
    }

    /// Shard metadata for the target, fetched once per group.
    async fn shard_metadata(&self, target: &CollectionTarget) -> ShardMetadata {
        let ns = &target.namespace;
        if let Some(meta) = self.state.shard_metadata(ns) {
            return meta;
        }
        match self.store.shard_metadata(ns).await {
            Ok(meta) => {
                self.state.cache_shard_metadata(ns, meta.clone());
                meta
            }
            Err(e) => {
                debug!("Could not read shard metadata for {ns}, treating it as unsharded: {e}");
                ShardMetadata::unsharded()
            }
        }
    }
}
