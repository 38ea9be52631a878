//! Operation mix normalization.
//!
//! User percentages, skip flags and the built-in defaults are reconciled
//! once per run into a [`WorkloadRatios`] vector that sums to 100.

use tracing::{info, warn};
use workload_types::OperationKind;

/// Built-in mix: insert 10, update 20, delete 10, select 60.
pub const DEFAULT_RATIOS: WorkloadRatios = WorkloadRatios {
    insert: 10.0,
    update: 20.0,
    delete: 10.0,
    select: 60.0,
};

/// Percentage of operations per kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadRatios {
    pub insert: f64,
    pub update: f64,
    pub delete: f64,
    pub select: f64,
}

impl Default for WorkloadRatios {
    fn default() -> Self {
        DEFAULT_RATIOS
    }
}

impl WorkloadRatios {
    pub fn get(&self, kind: OperationKind) -> f64 {
        match kind {
            OperationKind::Insert => self.insert,
            OperationKind::Update => self.update,
            OperationKind::Delete => self.delete,
            OperationKind::Select => self.select,
        }
    }

    /// Ratios in [`OperationKind::ALL`] order.
    pub fn as_array(&self) -> [f64; 4] {
        [self.insert, self.update, self.delete, self.select]
    }

    fn from_array(values: [f64; 4]) -> Self {
        Self {
            insert: values[0],
            update: values[1],
            delete: values[2],
            select: values[3],
        }
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Whether no operation can be drawn.
    pub fn is_all_zero(&self) -> bool {
        self.as_array().iter().all(|r| *r <= 0.0)
    }

    /// Kinds with a positive ratio, paired with their weight.
    pub fn weighted_kinds(&self) -> Vec<(OperationKind, f64)> {
        OperationKind::ALL
            .iter()
            .map(|k| (*k, self.get(*k)))
            .filter(|(_, w)| *w > 0.0)
            .collect()
    }
}

/// User-supplied ratio configuration before normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatioInput {
    pub insert: Option<f64>,
    pub update: Option<f64>,
    pub delete: Option<f64>,
    pub select: Option<f64>,
    pub skip_insert: bool,
    pub skip_update: bool,
    pub skip_delete: bool,
    pub skip_select: bool,
}

impl RatioInput {
    fn specified(&self) -> [Option<f64>; 4] {
        [self.insert, self.update, self.delete, self.select]
    }

    fn skips(&self) -> [bool; 4] {
        [
            self.skip_insert,
            self.skip_update,
            self.skip_delete,
            self.skip_select,
        ]
    }

    /// Reconcile this input into a ratio vector summing to 100.
    ///
    /// Skipped kinds are forced to 0 and count as specified. When the
    /// specified ratios exceed 100 the defaults are returned unchanged.
    /// Otherwise the remainder is spread over unspecified kinds by default
    /// weight, then the whole vector is rescaled to 100. An all-zero result
    /// stays all-zero.
    pub fn normalize(&self) -> WorkloadRatios {
        let defaults = DEFAULT_RATIOS.as_array();

        let mut ratios = self.specified();
        for (ratio, skip) in ratios.iter_mut().zip(self.skips()) {
            if skip {
                *ratio = Some(0.0);
            }
        }

        let specified_sum: f64 = ratios.iter().flatten().map(|r| r.max(0.0)).sum();
        if specified_sum > 100.0 {
            warn!(
                "The total workload ratio is {}%, which exceeds 100%. Each workload ratio will be adjusted to their default values.",
                round_to(specified_sum, 2)
            );
            return DEFAULT_RATIOS;
        }

        let remaining = round_to(100.0 - specified_sum, 10);
        let unspecified_weight: f64 = ratios
            .iter()
            .zip(defaults)
            .filter(|(r, _)| r.is_none())
            .map(|(_, d)| d)
            .sum();

        let mut values = [0.0; 4];
        for (i, ratio) in ratios.iter().enumerate() {
            values[i] = match ratio {
                Some(r) => r.max(0.0),
                None if unspecified_weight > 0.0 => {
                    round_to(defaults[i] / unspecified_weight * remaining, 10)
                }
                None => 0.0,
            };
        }

        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            warn!("Every workload ratio is 0%, no operations can be selected");
            return WorkloadRatios::from_array([0.0; 4]);
        }

        if total != 100.0 {
            info!(
                "The adjusted workload ratio is {}%, which is not 100%. Rebalancing the ratios...",
                round_to(total, 10)
            );
            let scale = 100.0 / total;
            for value in values.iter_mut() {
                *value = round_to(*value * scale, 10);
            }
        }

        WorkloadRatios::from_array(values)
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_sums_to_100(ratios: &WorkloadRatios) {
        assert!((ratios.sum() - 100.0).abs() < 1e-6, "sum was {}", ratios.sum());
    }

    #[test]
    fn test_defaults_when_nothing_specified() {
        assert_eq!(RatioInput::default().normalize(), DEFAULT_RATIOS);
    }

    #[test]
    fn test_over_100_returns_defaults() {
        let input = RatioInput {
            insert: Some(80.0),
            select: Some(50.0),
            ..RatioInput::default()
        };
        assert_eq!(input.normalize(), DEFAULT_RATIOS);
    }

    #[test]
    fn test_select_only_scenario() {
        let input = RatioInput {
            insert: Some(0.0),
            update: Some(0.0),
            delete: Some(0.0),
            select: Some(100.0),
            ..RatioInput::default()
        };
        let ratios = input.normalize();
        assert_eq!(ratios.select, 100.0);
        assert_eq!(ratios.insert, 0.0);
        assert_eq!(ratios.update, 0.0);
        assert_eq!(ratios.delete, 0.0);
    }

    #[test]
    fn test_remaining_distributed_by_default_weight() {
        let input = RatioInput {
            insert: Some(50.0),
            ..RatioInput::default()
        };
        let ratios = input.normalize();
        assert_eq!(ratios.insert, 50.0);
        // 50 remaining split 20:10:60
        assert!((ratios.update - 50.0 * 20.0 / 90.0).abs() < 1e-9);
        assert!((ratios.delete - 50.0 * 10.0 / 90.0).abs() < 1e-9);
        assert!((ratios.select - 50.0 * 60.0 / 90.0).abs() < 1e-9);
        assert_sums_to_100(&ratios);
    }

    #[test]
    fn test_skip_forces_zero_and_rescales() {
        let input = RatioInput {
            skip_select: true,
            ..RatioInput::default()
        };
        let ratios = input.normalize();
        assert_eq!(ratios.select, 0.0);
        assert!((ratios.insert - 25.0).abs() < 1e-9);
        assert!((ratios.update - 50.0).abs() < 1e-9);
        assert!((ratios.delete - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_specified_below_100_rescaled() {
        let input = RatioInput {
            insert: Some(10.0),
            update: Some(10.0),
            delete: Some(10.0),
            select: Some(20.0),
            ..RatioInput::default()
        };
        let ratios = input.normalize();
        assert!((ratios.select - 40.0).abs() < 1e-9);
        assert_sums_to_100(&ratios);
    }

    #[test]
    fn test_all_skipped_stays_zero() {
        let input = RatioInput {
            skip_insert: true,
            skip_update: true,
            skip_delete: true,
            skip_select: true,
            ..RatioInput::default()
        };
        let ratios = input.normalize();
        assert!(ratios.is_all_zero());
        assert!(ratios.weighted_kinds().is_empty());
    }

    #[test]
    fn test_random_inputs_sum_to_100_and_skips_are_zero() {
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..2_000 {
            let pick = |rng: &mut StdRng| rng.gen_bool(0.5).then(|| rng.gen_range(0.0..25.0));
            let input = RatioInput {
                insert: pick(&mut rng),
                update: pick(&mut rng),
                delete: pick(&mut rng),
                select: pick(&mut rng),
                skip_insert: rng.gen_bool(0.2),
                skip_update: rng.gen_bool(0.2),
                skip_delete: rng.gen_bool(0.2),
                skip_select: rng.gen_bool(0.2),
            };
            let ratios = input.normalize();

            if !ratios.is_all_zero() {
                assert_sums_to_100(&ratios);
            }
            for (kind, skipped) in OperationKind::ALL.iter().zip(input.skips()) {
                if skipped {
                    assert_eq!(ratios.get(*kind), 0.0);
                }
            }
        }
    }
}
