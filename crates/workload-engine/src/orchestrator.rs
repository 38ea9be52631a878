//! Worker groups, shutdown and result collection.
//!
//! A run is `groups` independent worker groups. Each group owns its store
//! client, its [`WorkerSharedState`] and a reporter task, and runs `threads`
//! worker tasks. One aggregator task logs cross-group throughput. The run
//! ends when the deadline passes or the cancellation token fires; workers
//! get a bounded grace period to finish their current operation.

use crate::handlers::OperationHandler;
use crate::ratio::WorkloadRatios;
use crate::replay::{run_custom_worker, QueryReplay};
use crate::report::{run_aggregator, run_reporter};
use crate::state::{OperationCounters, WorkerSharedState};
use crate::store::{CollectionStats, WorkloadStore};
use crate::target::CollectionTarget;
use crate::worker::{run_random_worker, worker_rng, StopCondition};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use workload_generator::DocumentGenerator;
use workload_types::QueryMode;

/// Immutable settings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub runtime: Duration,
    pub groups: usize,
    pub threads: usize,
    pub batch_size: usize,
    pub mode: QueryMode,
    pub ratios: WorkloadRatios,
    pub report_interval: Duration,
    pub shutdown_grace: Duration,
    pub seed: Option<u64>,
}

/// Everything collected at the end of a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub elapsed: Duration,
    /// Counters per group, in group order.
    pub groups: Vec<OperationCounters>,
    pub collections: Vec<CollectionStats>,
}

/// Cancel `cancel` on Ctrl+C.
pub fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => {
                    info!("Received Ctrl+C, stopping workload...");
                    cancel.cancel();
                }
                Err(e) => warn!("Failed to listen for Ctrl+C: {e}"),
            },
            _ = cancel.cancelled() => {}
        }
    });
}

struct Group<S> {
    store: Arc<S>,
    state: Arc<WorkerSharedState>,
}

/// Run the workload to completion.
///
/// `store_for_group` builds the store of each group; the first group's store
/// also reads the collection statistics at the end.
pub async fn run_workload<S, F>(
    settings: &RunSettings,
    targets: Arc<Vec<CollectionTarget>>,
    generator: Arc<DocumentGenerator>,
    replay: Option<Arc<QueryReplay>>,
    store_for_group: F,
    cancel: CancellationToken,
) -> RunResult
where
    S: WorkloadStore + 'static,
    F: Fn(usize) -> S,
{
    let started = Instant::now();
    let deadline = started + settings.runtime;
    let stop = StopCondition {
        deadline,
        cancel: cancel.clone(),
    };
    let groups_count = settings.groups.max(1);

    let timer_cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                debug!("Run deadline reached");
                timer_cancel.cancel();
            }
            _ = timer_cancel.cancelled() => {}
        }
    });

    let (tx, rx) = mpsc::channel(groups_count * 4);
    let aggregator = tokio::spawn(run_aggregator(
        groups_count,
        settings.report_interval,
        rx,
        cancel.clone(),
    ));

    let mut workers = JoinSet::new();
    let mut reporters = JoinSet::new();
    let mut groups = Vec::with_capacity(groups_count);

    for group in 0..groups_count {
        let store = Arc::new(store_for_group(group));
        let state = Arc::new(WorkerSharedState::new(group));
        let handler = Arc::new(OperationHandler::new(
            Arc::clone(&store),
            Arc::clone(&state),
            Arc::clone(&generator),
            settings.batch_size,
            settings.mode,
        ));

        for worker in 0..settings.threads.max(1) {
            let worker_id = group * settings.threads.max(1) + worker;
            let rng = worker_rng(settings.seed, group, worker);
            let handler = Arc::clone(&handler);
            let targets = Arc::clone(&targets);
            let stop = stop.clone();
            let ratios = settings.ratios;
            match &replay {
                Some(replay) => {
                    let replay = Arc::clone(replay);
                    workers.spawn(run_custom_worker(
                        worker_id, handler, replay, targets, ratios, stop, rng,
                    ));
                }
                None => {
                    workers.spawn(run_random_worker(
                        worker_id, handler, targets, ratios, stop, rng,
                    ));
                }
            }
        }

        reporters.spawn(run_reporter(
            Arc::clone(&state),
            settings.report_interval,
            tx.clone(),
            cancel.clone(),
        ));
        groups.push(Group { store, state });
    }
    drop(tx);

    info!(
        "Started {} worker group(s) with {} worker(s) each",
        groups_count,
        settings.threads.max(1)
    );

    let mut dispatched = 0u64;
    let grace = settings.shutdown_grace;
    let drain = async {
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(ops) => dispatched += ops,
                Err(e) if e.is_panic() => error!("Worker task panicked: {e}"),
                Err(_) => {}
            }
        }
    };
    let grace_expired = async {
        cancel.cancelled().await;
        tokio::time::sleep(grace).await;
    };
    tokio::select! {
        _ = drain => {}
        _ = grace_expired => {
            warn!("Workers did not stop within {grace:?}, aborting the remaining tasks");
        }
    }
    workers.abort_all();
    debug!("Workers dispatched {dispatched} operations");

    cancel.cancel();
    while reporters.join_next().await.is_some() {}
    if let Err(e) = aggregator.await {
        warn!("Throughput aggregator failed: {e}");
    }

    let elapsed = started.elapsed();
    let counters = groups.iter().map(|g| g.state.snapshot()).collect();

    let mut collections = Vec::with_capacity(targets.len());
    if let Some(first) = groups.first() {
        for target in targets.iter() {
            match first.store.collection_stats(&target.namespace).await {
                Ok(stats) => collections.push(stats),
                Err(e) => error!("Error retrieving stats for {}: {e}", target.namespace),
            }
        }
    }

    RunResult {
        elapsed,
        groups: counters,
        collections,
    }
}
