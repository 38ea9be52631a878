//! Run configuration built once from the command line.

pub mod duration;

pub use duration::{describe_duration, parse_duration, parse_duration_to_secs};

use crate::args::Args;
use anyhow::Context;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use workload_engine::{RatioInput, RunSettings, WorkloadRatios};
use workload_types::QueryMode;

/// Directory searched for collection definitions given by name.
pub const COLLECTION_DEF_DIR: &str = "collections";

/// Immutable configuration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub uri: String,
    pub definitions: PathBuf,
    pub custom_queries: Option<PathBuf>,
    /// Instances per collection definition
    pub instances: usize,
    pub recreate: bool,
    pub runtime: Duration,
    pub batch_size: usize,
    pub threads: usize,
    /// Worker groups
    pub groups: usize,
    pub ratios: WorkloadRatios,
    pub mode: QueryMode,
    pub report_interval: Duration,
    pub shutdown_grace: Duration,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        Self::with_available_cpus(args, num_cpus::get())
    }

    /// Build the configuration with `--cpu` capped at `available_cpus`.
    pub fn with_available_cpus(args: &Args, available_cpus: usize) -> anyhow::Result<Self> {
        let runtime = parse_duration(&args.runtime)
            .with_context(|| format!("Invalid --runtime '{}'", args.runtime))?;
        if runtime.is_zero() {
            anyhow::bail!("--runtime must be greater than zero");
        }
        let report_interval = parse_duration(&args.report_interval)
            .with_context(|| format!("Invalid --report-interval '{}'", args.report_interval))?;
        if report_interval.is_zero() {
            anyhow::bail!("--report-interval must be greater than zero");
        }
        let shutdown_grace = parse_duration(&args.shutdown_grace)
            .with_context(|| format!("Invalid --shutdown-grace '{}'", args.shutdown_grace))?;

        // Deadlines and ticks are computed as `Instant::now() + duration`.
        let now = Instant::now();
        for (flag, duration) in [
            ("--runtime", runtime),
            ("--report-interval", report_interval),
            ("--shutdown-grace", shutdown_grace),
        ] {
            if now.checked_add(duration).is_none() {
                anyhow::bail!("{flag} is too large: {} seconds", duration.as_secs());
            }
        }

        if args.batch_size == 0 {
            anyhow::bail!("--batch-size must be at least 1");
        }
        if args.threads == 0 {
            anyhow::bail!("--threads must be at least 1");
        }
        if args.cpu == 0 {
            anyhow::bail!("--cpu must be at least 1");
        }
        if args.collections == 0 {
            anyhow::bail!("--collections must be at least 1");
        }

        for (flag, ratio) in [
            ("--insert-ratio", args.insert_ratio),
            ("--update-ratio", args.update_ratio),
            ("--delete-ratio", args.delete_ratio),
            ("--select-ratio", args.select_ratio),
        ] {
            if let Some(ratio) = ratio {
                if !(0.0..=100.0).contains(&ratio) {
                    anyhow::bail!("{flag} must be between 0 and 100, got {ratio}");
                }
            }
        }

        let available_cpus = available_cpus.max(1);
        let groups = if args.cpu > available_cpus {
            info!(
                "Cannot set CPU to {} as there are only {available_cpus} available. Workload will be configured to use {available_cpus} CPUs.",
                args.cpu
            );
            available_cpus
        } else {
            args.cpu
        };

        let definitions = if args.collection_definition.exists()
            || args.collection_definition.starts_with(COLLECTION_DEF_DIR)
        {
            args.collection_definition.clone()
        } else {
            PathBuf::from(COLLECTION_DEF_DIR).join(&args.collection_definition)
        };

        // Instances and optimized mode only apply to generated queries.
        let custom = args.custom_queries.is_some();
        let ratios = RatioInput {
            insert: args.insert_ratio,
            update: args.update_ratio,
            delete: args.delete_ratio,
            select: args.select_ratio,
            skip_insert: args.skip_insert,
            skip_update: args.skip_update,
            skip_delete: args.skip_delete,
            skip_select: args.skip_select,
        }
        .normalize();

        Ok(Self {
            uri: args.uri.clone(),
            definitions,
            custom_queries: args.custom_queries.clone(),
            instances: if custom { 1 } else { args.collections },
            recreate: args.recreate,
            runtime,
            batch_size: args.batch_size,
            threads: args.threads,
            groups,
            ratios,
            mode: QueryMode::from_optimized(args.optimized && !custom),
            report_interval,
            shutdown_grace,
            log_file: args.log.clone(),
            debug: args.debug,
            seed: args.seed,
        })
    }

    pub fn is_custom(&self) -> bool {
        self.custom_queries.is_some()
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            runtime: self.runtime,
            groups: self.groups,
            threads: self.threads,
            batch_size: self.batch_size,
            mode: self.mode,
            ratios: self.ratios,
            report_interval: self.report_interval,
            shutdown_grace: self.shutdown_grace,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["mongodb-workload"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_produce_default_mix() {
        let config = RunConfig::with_available_cpus(&args(&[]), 8).unwrap();
        assert_eq!(config.runtime, Duration::from_secs(60));
        assert_eq!(config.report_interval, Duration::from_secs(5));
        assert_eq!(config.groups, 1);
        assert_eq!(config.ratios, WorkloadRatios::default());
        assert_eq!(config.mode, QueryMode::Ineffective);
        assert_eq!(config.definitions, PathBuf::from(COLLECTION_DEF_DIR));
    }

    #[test]
    fn test_missing_definition_names_resolve_under_collections_dir() {
        let config = RunConfig::with_available_cpus(
            &args(&["--collection-definition", "no_such_airline.json"]),
            4,
        )
        .unwrap();
        assert_eq!(
            config.definitions,
            PathBuf::from(COLLECTION_DEF_DIR).join("no_such_airline.json")
        );
    }

    #[test]
    fn test_cpu_is_capped() {
        let config = RunConfig::with_available_cpus(&args(&["--cpu", "64"]), 4).unwrap();
        assert_eq!(config.groups, 4);
    }

    #[test]
    fn test_custom_queries_disable_instances_and_optimized() {
        let config = RunConfig::with_available_cpus(
            &args(&["--custom-queries", "--collections", "3", "--optimized"]),
            4,
        )
        .unwrap();
        assert!(config.is_custom());
        assert_eq!(config.instances, 1);
        assert_eq!(config.mode, QueryMode::Ineffective);
    }

    #[test]
    fn test_skip_flags_zero_ratios() {
        let config = RunConfig::with_available_cpus(
            &args(&["--skip-insert", "--skip-delete", "--skip-update"]),
            4,
        )
        .unwrap();
        assert_eq!(config.ratios.select, 100.0);
        assert_eq!(config.ratios.insert, 0.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(RunConfig::with_available_cpus(&args(&["--runtime", "soon"]), 4).is_err());
        assert!(RunConfig::with_available_cpus(&args(&["--runtime", "0s"]), 4).is_err());
        assert!(RunConfig::with_available_cpus(&args(&["--threads", "0"]), 4).is_err());
        assert!(RunConfig::with_available_cpus(&args(&["--select-ratio", "150"]), 4).is_err());
    }

    #[test]
    fn test_unrepresentable_durations_are_rejected() {
        let max = u64::MAX.to_string();
        let max = max.as_str();
        assert!(RunConfig::with_available_cpus(&args(&["--runtime", max]), 4).is_err());
        assert!(RunConfig::with_available_cpus(&args(&["--report-interval", max]), 4).is_err());
        assert!(
            RunConfig::with_available_cpus(&args(&["--runtime", "9999999999999999h"]), 4).is_err()
        );
        assert!(RunConfig::with_available_cpus(&args(&["--runtime", "100000h"]), 4).is_ok());
    }

    #[test]
    fn test_run_settings_mirror_config() {
        let config = RunConfig::with_available_cpus(
            &args(&["--optimized", "--seed", "9", "--threads", "2"]),
            4,
        )
        .unwrap();
        let settings = config.run_settings();
        assert_eq!(settings.mode, QueryMode::Optimized);
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.threads, 2);
    }
}
