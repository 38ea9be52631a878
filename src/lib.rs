//! mongodb-workload
//!
//! A configurable load generator that drives insert, select, update and
//! delete traffic against a MongoDB deployment.
//!
//! # Features
//!
//! - Schema-driven document generation from JSON collection definitions
//! - Optimized (key-routed) and ineffective (broadcast) query shapes
//! - Shard-key aware guards for sharded clusters
//! - Replay of user query templates with `<placeholder>` substitution
//! - Concurrent worker groups with periodic throughput reporting
//!
//! # CLI Usage
//!
//! ```bash
//! # One minute of the default mix against a local deployment
//! mongodb-workload --uri mongodb://localhost:27017 \
//!   --collection-definition demos/collections/airline.json
//!
//! # Read-heavy, key-routed workload on three collection instances
//! mongodb-workload --collections 3 --optimized --select-ratio 90 --runtime 5m
//!
//! # Replay custom queries for 30 seconds on 4 worker groups
//! mongodb-workload --custom-queries demos/queries --cpu 4 --runtime 30s
//! ```

pub mod args;
pub mod config;
pub mod loader;
pub mod logging;
pub mod run;

pub use args::Args;
pub use config::RunConfig;
pub use loader::{load_definitions, load_queries, DefinitionError};
pub use logging::{init_logging, mask_connection_password};
pub use run::run_workload_from_config;
