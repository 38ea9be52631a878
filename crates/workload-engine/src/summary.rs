//! End-of-run summary tables.

use crate::state::OperationCounters;
use crate::store::CollectionStats;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use std::time::Duration;
use workload_types::OperationKind;

const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = MB * 1024.0;

/// Workload totals across every group.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSummary {
    pub runtime: Duration,
    pub groups: usize,
    pub counters: OperationCounters,
}

impl WorkloadSummary {
    pub fn new(runtime: Duration, groups: &[OperationCounters]) -> Self {
        let mut counters = OperationCounters::default();
        for group in groups {
            counters.merge(group);
        }
        Self {
            runtime,
            groups: groups.len(),
            counters,
        }
    }

    /// Average operations per second for `kind` over the run.
    pub fn per_second(&self, kind: OperationKind) -> f64 {
        let secs = self.runtime.as_secs_f64();
        if secs > 0.0 {
            self.counters.ops(kind) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Collection size and document table.
pub fn format_collection_table(stats: &[CollectionStats]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Collection", "Sharded", "Size", "Documents"]);

    let mut total_size = 0;
    let mut total_docs = 0;
    for entry in stats {
        total_size += entry.size_bytes;
        total_docs += entry.documents;

        let sharded = if entry.sharded {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no")
        };
        table.add_row(vec![
            Cell::new(&entry.namespace),
            sharded,
            Cell::new(format_size(entry.size_bytes)),
            Cell::new(format_number(entry.documents)),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan),
        Cell::new(format!("{} collections", stats.len())),
        Cell::new(format_size(total_size)),
        Cell::new(format_number(total_docs)),
    ]);

    table.to_string()
}

/// Operation totals, rates and affected documents.
pub fn format_workload_table(summary: &WorkloadSummary) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Operation", "Total", "AVG/s", "Documents"]);

    let counters = &summary.counters;
    for (label, kind) in [
        ("Inserts", OperationKind::Insert),
        ("Selects", OperationKind::Select),
        ("Updates", OperationKind::Update),
        ("Deletes", OperationKind::Delete),
    ] {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format_number(counters.ops(kind))),
            Cell::new(format!("{:.2}", summary.per_second(kind))),
            Cell::new(format_number(counters.docs(kind))),
        ]);
    }

    let total_rate: f64 = OperationKind::ALL
        .iter()
        .map(|kind| summary.per_second(*kind))
        .sum();
    table.add_row(vec![
        Cell::new("TOTAL").fg(Color::Cyan),
        Cell::new(format_number(counters.total_ops())),
        Cell::new(format!("{total_rate:.2}")),
        Cell::new(format!(
            "{} in {} group(s)",
            format_duration(summary.runtime.as_secs_f64()),
            summary.groups
        )),
    ]);

    table.to_string()
}

/// Byte count as MB, or GB from one gigabyte up.
pub fn format_size(bytes: u64) -> String {
    let bytes = bytes as f64;
    if bytes >= GB {
        format!("{:.2} GB", bytes / GB)
    } else {
        format!("{:.2} MB", bytes / MB)
    }
}

/// Format duration in human-readable format.
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{secs:.1}s")
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        let remaining_secs = secs - (mins * 60.0);
        format!("{}m {:02.0}s", mins as u64, remaining_secs)
    } else {
        let hours = (secs / 3600.0).floor();
        let remaining = secs - (hours * 3600.0);
        let mins = (remaining / 60.0).floor();
        format!("{}h {:02.0}m", hours as u64, mins as u64)
    }
}

/// Format number with thousands separators.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5.5), "5.5s");
        assert_eq!(format_duration(65.0), "1m 05s");
        assert_eq!(format_duration(3661.0), "1h 01m");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(12345678), "12,345,678");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 MB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_summary_merges_groups() {
        let mut a = OperationCounters::default();
        a.record(OperationKind::Select, 4);
        let mut b = OperationCounters::default();
        b.record(OperationKind::Select, 6);
        b.record(OperationKind::Insert, 10);

        let summary = WorkloadSummary::new(Duration::from_secs(2), &[a, b]);
        assert_eq!(summary.groups, 2);
        assert_eq!(summary.counters.selects, 2);
        assert_eq!(summary.counters.docs_selected, 10);
        assert_eq!(summary.per_second(OperationKind::Select), 1.0);

        let table = format_workload_table(&summary);
        assert!(table.contains("Selects"));
        assert!(table.contains("TOTAL"));
    }

    #[test]
    fn test_collection_table() {
        let stats = vec![CollectionStats {
            namespace: "airline.flights".into(),
            sharded: true,
            size_bytes: 2 * 1024 * 1024,
            documents: 1500,
        }];
        let table = format_collection_table(&stats);
        assert!(table.contains("airline.flights"));
        assert!(table.contains("2.00 MB"));
        assert!(table.contains("1,500"));
    }
}
