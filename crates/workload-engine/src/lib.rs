//! Workload engine for mongodb-workload.
//!
//! Plans, guards and executes randomized (or replayed) MongoDB operations
//! across concurrent worker groups, and reports throughput while running.
//!
//! # Architecture
//!
//! ```text
//! orchestrator ── group 0 ── reporter ──┐
//!      │             ├── worker 0       │ mpsc
//!      │             └── worker N       ├──── aggregator ── log line
//!      └──────── group M ── reporter ───┘
//!
//! worker ── OperationPicker ── OperationHandler ── planner ── guard ── WorkloadStore
//! ```
//!
//! - [`ratio`] - Operation mix normalization
//! - [`planner`] - Optimized / ineffective query candidates
//! - [`guard`] - Shard key checks for sharded collections
//! - [`handlers`] - Insert, select, update and delete
//! - [`replay`] - Custom query templates
//! - [`store`] / [`mongo`] - Store boundary and its MongoDB implementation

pub mod guard;
pub mod handlers;
pub mod mongo;
pub mod orchestrator;
pub mod planner;
pub mod ratio;
pub mod replay;
pub mod report;
pub mod setup;
pub mod state;
pub mod store;
pub mod summary;
pub mod target;
pub mod worker;

pub use guard::{assess, GuardDecision, ShardMetadata};
pub use handlers::{OperationHandler, Outcome};
pub use mongo::MongoStore;
pub use orchestrator::{run_workload, spawn_ctrl_c_handler, RunResult, RunSettings};
pub use ratio::{RatioInput, WorkloadRatios, DEFAULT_RATIOS};
pub use replay::{QueryReplay, QueryTemplate};
pub use setup::{prepare_collections, SetupOptions, SetupReport};
pub use state::{OperationCounters, WorkerSharedState};
pub use store::{CollectionStats, IndexSpec, StoreError, UpdateOutcome, WorkloadStore};
pub use summary::WorkloadSummary;
pub use target::CollectionTarget;
