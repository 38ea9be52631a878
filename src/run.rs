//! End-to-end run: load inputs, prepare collections, drive the workload and
//! log the summaries.

use crate::config::{describe_duration, RunConfig};
use crate::loader::{load_definitions, load_queries};
use crate::logging::mask_connection_password;
use anyhow::Context;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use workload_engine::summary::{format_collection_table, format_workload_table};
use workload_engine::{
    prepare_collections, run_workload, spawn_ctrl_c_handler, CollectionTarget, MongoStore,
    QueryReplay, SetupOptions, SetupReport, WorkloadRatios, WorkloadSummary,
};
use workload_generator::{DocumentGenerator, ProviderRegistry};
use workload_types::CollectionDefinition;

const BANNER_WIDTH: usize = 115;

fn rule() -> String {
    "=".repeat(BANNER_WIDTH)
}

fn heading(title: &str) -> String {
    format!("{}\n{title:^width$}\n{}", rule(), rule(), width = BANNER_WIDTH)
}

/// Ratios as whole percentages, selects first.
pub fn format_ratios(ratios: &WorkloadRatios) -> String {
    format!(
        "SELECTS: {:.0}% | INSERTS: {:.0}% | UPDATES: {:.0}% | DELETES: {:.0}%",
        ratios.select.round(),
        ratios.insert.round(),
        ratios.update.round(),
        ratios.delete.round()
    )
}

/// The configuration block logged before workers start.
pub fn format_banner(
    config: &RunConfig,
    definitions: &[Arc<CollectionDefinition>],
    setup: &SetupReport,
) -> String {
    let namespaces = definitions
        .iter()
        .map(|def| def.namespace().to_string())
        .collect::<Vec<_>>()
        .join(" | ");
    let custom = config.is_custom();
    let disabled_or = |value: String| {
        if custom {
            "Disabled".to_string()
        } else {
            value
        }
    };
    let log_file = config
        .log_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "None".to_string());

    format!(
        "\n\
         Duration: {}\n\
         CPUs: {}\n\
         Threads: (Per CPU: {} | Total: {})\n\
         Database and Collection: ({namespaces})\n\
         Instances of the same collection: {}\n\
         Configure Sharding: {}\n\
         Insert batch size: {}\n\
         Optimized workload: {}\n\
         Workload ratio: ({})\n\
         Report frequency: {}\n\
         Report logfile: {log_file}\n\n\
         {}",
        describe_duration(config.runtime),
        config.groups,
        config.threads,
        config.groups * config.threads,
        disabled_or(config.instances.to_string()),
        !setup.sharded.is_empty(),
        config.batch_size,
        disabled_or(config.mode.is_optimized().to_string()),
        format_ratios(&config.ratios),
        describe_duration(config.report_interval),
        heading("Workload Started"),
    )
}

/// Run the whole workload described by `config`.
pub async fn run_workload_from_config(config: &RunConfig) -> anyhow::Result<()> {
    let definitions: Vec<Arc<CollectionDefinition>> = load_definitions(&config.definitions)
        .with_context(|| {
            format!(
                "Failed to load collection definitions from {}",
                config.definitions.display()
            )
        })?
        .into_iter()
        .map(Arc::new)
        .collect();

    let registry = Arc::new(ProviderRegistry::builtin());
    let replay = match &config.custom_queries {
        Some(path) => {
            let templates = load_queries(path)
                .with_context(|| format!("Failed to load custom queries from {}", path.display()))?;
            if templates.is_empty() {
                warn!("No custom queries loaded; only random inserts will run");
            }
            Some(Arc::new(QueryReplay::new(Arc::clone(&registry), templates)))
        }
        None => None,
    };

    info!(
        "Connecting to MongoDB at {}",
        mask_connection_password(&config.uri)
    );
    let store = MongoStore::connect(config.uri.as_str())
        .await
        .context("Failed to connect to MongoDB")?;

    let setup = prepare_collections(
        &store,
        &definitions,
        SetupOptions {
            instances: config.instances,
            recreate: config.recreate,
        },
    )
    .await;
    drop(store);

    let generator = Arc::new(DocumentGenerator::new(registry));
    let targets = Arc::new(CollectionTarget::expand(
        &definitions,
        config.instances,
        &generator,
    ));

    info!("{}", format_banner(config, &definitions, &setup));

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let uri = config.uri.clone();
    let result = run_workload(
        &config.run_settings(),
        targets,
        generator,
        replay,
        |_| MongoStore::lazy(uri.as_str()),
        cancel,
    )
    .await;

    info!("\n{}", heading("Workload Finished"));
    info!("\n{}", format_collection_table(&result.collections));
    let summary = WorkloadSummary::new(result.elapsed, &result.groups);
    info!("\n{}", format_workload_table(&summary));
    Ok(())
}
