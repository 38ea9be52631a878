//! Per-group mutable state: operation counters, key cache and shard
//! metadata cache.
//!
//! Every worker task in a group shares one [`WorkerSharedState`] through an
//! `Arc`. Counters and cache are guarded by a single mutex so an insert's
//! counter bump and key append are observed together. The lock is never
//! held across an `.await`.

use crate::guard::ShardMetadata;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use workload_types::{GeneratedValue, Namespace, OperationKind};

/// Operation and document counters for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounters {
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub selects: u64,
    pub docs_inserted: u64,
    pub docs_updated: u64,
    pub docs_deleted: u64,
    pub docs_selected: u64,
}

impl OperationCounters {
    /// Count one attempted operation affecting `docs` documents.
    pub fn record(&mut self, kind: OperationKind, docs: u64) {
        let (ops, total) = match kind {
            OperationKind::Insert => (&mut self.inserts, &mut self.docs_inserted),
            OperationKind::Update => (&mut self.updates, &mut self.docs_updated),
            OperationKind::Delete => (&mut self.deletes, &mut self.docs_deleted),
            OperationKind::Select => (&mut self.selects, &mut self.docs_selected),
        };
        *ops += 1;
        *total += docs;
    }

    pub fn ops(&self, kind: OperationKind) -> u64 {
        match kind {
            OperationKind::Insert => self.inserts,
            OperationKind::Update => self.updates,
            OperationKind::Delete => self.deletes,
            OperationKind::Select => self.selects,
        }
    }

    pub fn docs(&self, kind: OperationKind) -> u64 {
        match kind {
            OperationKind::Insert => self.docs_inserted,
            OperationKind::Update => self.docs_updated,
            OperationKind::Delete => self.docs_deleted,
            OperationKind::Select => self.docs_selected,
        }
    }

    pub fn total_ops(&self) -> u64 {
        self.inserts + self.updates + self.deletes + self.selects
    }

    /// Add another group's counters into this one.
    pub fn merge(&mut self, other: &OperationCounters) {
        self.inserts += other.inserts;
        self.updates += other.updates;
        self.deletes += other.deletes;
        self.selects += other.selects;
        self.docs_inserted += other.docs_inserted;
        self.docs_updated += other.docs_updated;
        self.docs_deleted += other.docs_deleted;
        self.docs_selected += other.docs_selected;
    }
}

#[derive(Debug, Default)]
struct Shared {
    counters: OperationCounters,
    keys: HashMap<Namespace, Vec<GeneratedValue>>,
}

/// State shared by the worker tasks of one group.
#[derive(Debug)]
pub struct WorkerSharedState {
    group: usize,
    shared: Mutex<Shared>,
    shard_meta: Mutex<HashMap<Namespace, ShardMetadata>>,
}

impl WorkerSharedState {
    pub fn new(group: usize) -> Self {
        Self {
            group,
            shared: Mutex::new(Shared::default()),
            shard_meta: Mutex::new(HashMap::new()),
        }
    }

    pub fn group(&self) -> usize {
        self.group
    }

    // A panicking worker leaves the counters usable.
    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one attempted operation.
    pub fn record(&self, kind: OperationKind, docs: u64) {
        self.shared().counters.record(kind, docs);
    }

    /// Count one insert operation and cache the inserted keys.
    pub fn record_insert(&self, ns: &Namespace, docs: u64, keys: Vec<GeneratedValue>) {
        let mut shared = self.shared();
        shared.counters.record(OperationKind::Insert, docs);
        if !keys.is_empty() {
            shared.keys.entry(ns.clone()).or_default().extend(keys);
        }
    }

    /// A random cached key for the namespace.
    pub fn sample_key<R: Rng + ?Sized>(&self, ns: &Namespace, rng: &mut R) -> Option<GeneratedValue> {
        let shared = self.shared();
        let keys = shared.keys.get(ns)?;
        if keys.is_empty() {
            return None;
        }
        Some(keys[rng.gen_range(0..keys.len())].clone())
    }

    /// Remove one occurrence of `key` from the namespace cache.
    pub fn remove_key_once(&self, ns: &Namespace, key: &GeneratedValue) -> bool {
        let mut shared = self.shared();
        let Some(keys) = shared.keys.get_mut(ns) else {
            return false;
        };
        match keys.iter().position(|k| k == key) {
            Some(pos) => {
                keys.swap_remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of cached keys for the namespace.
    pub fn cached_keys(&self, ns: &Namespace) -> usize {
        self.shared().keys.get(ns).map_or(0, Vec::len)
    }

    /// Copy of the current counters.
    pub fn snapshot(&self) -> OperationCounters {
        self.shared().counters
    }

    pub fn shard_metadata(&self, ns: &Namespace) -> Option<ShardMetadata> {
        self.shard_meta
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(ns)
            .cloned()
    }

    pub fn cache_shard_metadata(&self, ns: &Namespace, meta: ShardMetadata) {
        self.shard_meta
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ns.clone(), meta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn ns() -> Namespace {
        Namespace::new("airline", "flights")
    }

    #[test]
    fn test_record_insert_counts_once_and_caches_keys() {
        let state = WorkerSharedState::new(0);
        let keys: Vec<GeneratedValue> = (0..10).map(GeneratedValue::Int32).collect();
        state.record_insert(&ns(), 10, keys);

        let counters = state.snapshot();
        assert_eq!(counters.inserts, 1);
        assert_eq!(counters.docs_inserted, 10);
        assert_eq!(state.cached_keys(&ns()), 10);
    }

    #[test]
    fn test_remove_key_once_removes_single_entry() {
        let state = WorkerSharedState::new(0);
        state.record_insert(&ns(), 3, vec![1.into(), 1.into(), 2.into()]);

        assert!(state.remove_key_once(&ns(), &GeneratedValue::Int32(1)));
        assert_eq!(state.cached_keys(&ns()), 2);
        assert!(!state.remove_key_once(&ns(), &GeneratedValue::Int32(9)));
        assert!(!state.remove_key_once(&Namespace::new("x", "y"), &GeneratedValue::Int32(1)));
    }

    #[test]
    fn test_sample_key_from_cache() {
        let state = WorkerSharedState::new(0);
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(state.sample_key(&ns(), &mut rng), None);

        state.record_insert(&ns(), 1, vec!["k".into()]);
        assert_eq!(state.sample_key(&ns(), &mut rng), Some("k".into()));
    }

    #[test]
    fn test_concurrent_records() {
        let state = Arc::new(WorkerSharedState::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        state.record(OperationKind::Select, 2);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let counters = state.snapshot();
        assert_eq!(counters.selects, 1_000);
        assert_eq!(counters.docs_selected, 2_000);
        assert_eq!(counters.total_ops(), 1_000);
    }

    #[test]
    fn test_merge_and_accessors() {
        let mut a = OperationCounters::default();
        a.record(OperationKind::Update, 3);
        let mut b = OperationCounters::default();
        b.record(OperationKind::Update, 4);
        b.record(OperationKind::Delete, 1);
        a.merge(&b);
        assert_eq!(a.ops(OperationKind::Update), 2);
        assert_eq!(a.docs(OperationKind::Update), 7);
        assert_eq!(a.ops(OperationKind::Delete), 1);
    }

    #[test]
    fn test_shard_metadata_cache() {
        let state = WorkerSharedState::new(0);
        assert!(state.shard_metadata(&ns()).is_none());
        state.cache_shard_metadata(&ns(), ShardMetadata::sharded(["flight_id"]));
        assert!(state.shard_metadata(&ns()).unwrap().is_sharded);
    }
}
