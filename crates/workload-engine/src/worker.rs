//! Worker task loop for the randomized workload.

use crate::handlers::OperationHandler;
use crate::ratio::WorkloadRatios;
use crate::store::WorkloadStore;
use crate::target::CollectionTarget;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use workload_types::OperationKind;

/// Weighted draw over operation kinds.
#[derive(Debug, Clone)]
pub struct OperationPicker {
    kinds: Vec<OperationKind>,
    index: WeightedIndex<f64>,
}

impl OperationPicker {
    /// Picker over kinds with a positive weight, `None` when there are none.
    pub fn from_weights(weights: Vec<(OperationKind, f64)>) -> Option<Self> {
        let weights: Vec<(OperationKind, f64)> =
            weights.into_iter().filter(|(_, w)| *w > 0.0).collect();
        if weights.is_empty() {
            return None;
        }
        let index = WeightedIndex::new(weights.iter().map(|(_, w)| *w)).ok()?;
        Some(Self {
            kinds: weights.into_iter().map(|(k, _)| k).collect(),
            index,
        })
    }

    pub fn from_ratios(ratios: &WorkloadRatios) -> Option<Self> {
        Self::from_weights(ratios.weighted_kinds())
    }

    pub fn kinds(&self) -> &[OperationKind] {
        &self.kinds
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> OperationKind {
        self.kinds[self.index.sample(rng)]
    }
}

/// Random source for one worker task.
///
/// With a run seed each worker gets its own reproducible stream; without
/// one the stream is seeded from the OS.
pub fn worker_rng(seed: Option<u64>, group: usize, worker: usize) -> StdRng {
    match seed {
        Some(seed) => {
            let stream = ((group as u64) << 32) | worker as u64;
            StdRng::seed_from_u64(seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        }
        None => StdRng::from_entropy(),
    }
}

/// When a worker stops.
#[derive(Debug, Clone)]
pub struct StopCondition {
    pub deadline: Instant,
    pub cancel: CancellationToken,
}

impl StopCondition {
    pub fn should_stop(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.deadline
    }
}

/// Run randomized operations until the stop condition fires.
///
/// Returns the number of operations dispatched.
pub async fn run_random_worker<S: WorkloadStore>(
    worker_id: usize,
    handler: Arc<OperationHandler<S>>,
    targets: Arc<Vec<CollectionTarget>>,
    ratios: WorkloadRatios,
    stop: StopCondition,
    mut rng: StdRng,
) -> u64 {
    let Some(picker) = OperationPicker::from_ratios(&ratios) else {
        warn!("Worker {worker_id}: every workload ratio is 0%, nothing to run");
        return 0;
    };
    if targets.is_empty() {
        warn!("Worker {worker_id}: no collections to run against");
        return 0;
    }

    let mut dispatched = 0u64;
    while !stop.should_stop() {
        let kind = picker.pick(&mut rng);
        let Some(target) = targets.choose(&mut rng) else {
            break;
        };
        handler.run(kind, target, &mut rng).await;
        dispatched += 1;
        tokio::task::yield_now().await;
    }

    debug!(
        "Worker {worker_id} of group {} stopped after {dispatched} operations",
        handler.state().group()
    );
    dispatched
}
