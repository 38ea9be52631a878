//! Periodic throughput reporting.
//!
//! Each group runs a reporter task that samples its counters once per
//! interval and sends per-second rates to a single aggregator task. The
//! aggregator keeps the latest sample of every group and logs the
//! cross-group total each interval.

use crate::state::{OperationCounters, WorkerSharedState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use workload_types::OperationKind;

/// Per-second operation rates of one group over the last interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    pub group: usize,
    /// Rates in [`OperationKind::ALL`] order.
    pub per_second: [f64; 4],
}

impl ThroughputSample {
    pub fn rate(&self, kind: OperationKind) -> f64 {
        self.per_second[kind.index()]
    }
}

/// Per-second rates between two counter snapshots.
pub fn rates(previous: &OperationCounters, current: &OperationCounters, interval: Duration) -> [f64; 4] {
    let secs = interval.as_secs_f64();
    let mut per_second = [0.0; 4];
    if secs <= 0.0 {
        return per_second;
    }
    for kind in OperationKind::ALL {
        let delta = current.ops(kind).saturating_sub(previous.ops(kind));
        per_second[kind.index()] = delta as f64 / secs;
    }
    per_second
}

/// Sample a group's counters every `interval` until cancelled.
pub async fn run_reporter(
    state: Arc<WorkerSharedState>,
    interval: Duration,
    tx: mpsc::Sender<ThroughputSample>,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = state.snapshot();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let current = state.snapshot();
                let sample = ThroughputSample {
                    group: state.group(),
                    per_second: rates(&last, &current, interval),
                };
                last = current;
                if tx.send(sample).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!("Reporter for group {} stopped", state.group());
}

/// Latest sample per group.
#[derive(Debug, Clone)]
pub struct ThroughputAggregator {
    slots: Vec<[f64; 4]>,
}

impl ThroughputAggregator {
    pub fn new(groups: usize) -> Self {
        Self {
            slots: vec![[0.0; 4]; groups],
        }
    }

    pub fn update(&mut self, sample: ThroughputSample) {
        if let Some(slot) = self.slots.get_mut(sample.group) {
            *slot = sample.per_second;
        }
    }

    /// Cross-group rates in [`OperationKind::ALL`] order.
    pub fn totals(&self) -> [f64; 4] {
        let mut totals = [0.0; 4];
        for slot in &self.slots {
            for (total, rate) in totals.iter_mut().zip(slot) {
                *total += rate;
            }
        }
        totals
    }

    pub fn total(&self) -> f64 {
        self.totals().iter().sum()
    }

    /// The interval log line, `None` when nothing ran.
    pub fn interval_line(&self, interval: Duration) -> Option<String> {
        let totals = self.totals();
        let total: f64 = totals.iter().sum();
        if total <= 0.0 {
            return None;
        }
        Some(format!(
            "AVG Operations last {}s ({} CPUs): {:.2} (SELECTS: {:.2}, INSERTS: {:.2}, UPDATES: {:.2}, DELETES: {:.2})",
            interval.as_secs(),
            self.slots.len(),
            total,
            totals[OperationKind::Select.index()],
            totals[OperationKind::Insert.index()],
            totals[OperationKind::Update.index()],
            totals[OperationKind::Delete.index()],
        ))
    }
}

/// Collect group samples and log the total once per interval.
pub async fn run_aggregator(
    groups: usize,
    interval: Duration,
    mut rx: mpsc::Receiver<ThroughputSample>,
    cancel: CancellationToken,
) {
    let mut aggregator = ThroughputAggregator::new(groups);
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            sample = rx.recv() => match sample {
                Some(sample) => aggregator.update(sample),
                None => break,
            },
            _ = ticker.tick() => {
                if let Some(line) = aggregator.interval_line(interval) {
                    info!("{line}");
                }
            }
        }
    }
}
