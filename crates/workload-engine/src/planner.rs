//! Query planning for select, update and delete.
//!
//! Each builder takes the primary key, its value and one sampled value per
//! candidate field, and returns parallel lists of *optimized* and
//! *ineffective* candidates. Optimized filters pin the key with an equality
//! predicate so the router can target one shard; ineffective filters leave
//! the key out and fan out to every shard.

use rand::Rng;
use workload_generator::generators::words;
use workload_types::values::round2;
use workload_types::{FieldType, Filter, GeneratedValue, Predicate, Projection, UpdateOp};

/// Upper bound offset range for numeric range predicates.
const RANGE_OFFSET: (i32, i32) = (1, 100);

/// Delta range for `$inc` updates.
const INC_DELTA: (i32, i32) = (1, 10);

/// Characters kept from a sampled string for prefix regex predicates.
const PREFIX_LEN: usize = 3;

/// A sampled value for one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSample {
    pub field: String,
    pub value: GeneratedValue,
    pub field_type: FieldType,
}

impl FieldSample {
    pub fn new(field: impl Into<String>, value: GeneratedValue, field_type: FieldType) -> Self {
        Self {
            field: field.into(),
            value,
            field_type,
        }
    }
}

/// A read with its projection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub filter: Filter,
    pub projection: Projection,
}

/// Select candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectPlan {
    pub optimized: Vec<SelectQuery>,
    pub ineffective: Vec<SelectQuery>,
}

/// An update body with its targeting filter.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateQuery {
    pub filter: Filter,
    pub ops: Vec<UpdateOp>,
}

impl UpdateQuery {
    /// Fields the update body modifies.
    pub fn modified_fields(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().map(UpdateOp::field)
    }
}

/// Update candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePlan {
    pub optimized: Vec<UpdateQuery>,
    pub ineffective: Vec<UpdateQuery>,
}

/// Delete candidates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeletePlan {
    pub optimized: Vec<Filter>,
    pub ineffective: Vec<Filter>,
}

/// Numeric view of a sample whose declared type is numeric.
fn numeric_value(sample: &FieldSample) -> Option<&GeneratedValue> {
    if sample.field_type.is_numeric() && sample.value.as_f64().is_some() {
        Some(&sample.value)
    } else {
        None
    }
}

fn range_upper<R: Rng + ?Sized>(value: &GeneratedValue, rng: &mut R) -> Option<GeneratedValue> {
    let offset = rng.gen_range(RANGE_OFFSET.0..=RANGE_OFFSET.1);
    value.offset_by(f64::from(offset))
}

fn prefix_of(value: &str) -> String {
    value.chars().take(PREFIX_LEN).collect()
}

/// Values for an `$in` predicate on an array field.
fn membership(value: &GeneratedValue) -> Vec<GeneratedValue> {
    match value {
        GeneratedValue::Array(items) if !items.is_empty() => items.clone(),
        GeneratedValue::Array(_) => Vec::new(),
        other => vec![other.clone()],
    }
}

/// Field predicates a sampled value supports, by declared type.
fn select_predicates<R: Rng + ?Sized>(sample: &FieldSample, rng: &mut R) -> Vec<Predicate> {
    let mut predicates = Vec::new();

    if let Some(value) = numeric_value(sample) {
        predicates.push(Predicate::Eq(value.clone()));
        predicates.push(Predicate::Gt(value.clone()));
        predicates.push(Predicate::Lt(value.clone()));
        if let Some(upper) = range_upper(value, rng) {
            predicates.push(Predicate::Range {
                gte: value.clone(),
                lte: upper,
            });
        }
        return predicates;
    }

    match (&sample.field_type, &sample.value) {
        (FieldType::String, GeneratedValue::String(s)) => {
            predicates.push(Predicate::Eq(sample.value.clone()));
            predicates.push(Predicate::prefix(&prefix_of(s)));
        }
        (ty, value) if ty.is_exact_only() && !value.is_null() => {
            predicates.push(Predicate::Eq(value.clone()));
        }
        (FieldType::Array, value) => {
            let values = membership(value);
            if !values.is_empty() {
                predicates.push(Predicate::In(values));
            }
        }
        _ => {}
    }
    predicates
}

/// Build select candidates.
///
/// The base pair is a key-only optimized read and an ineffective read that
/// only asserts the key exists.
pub fn plan_select<R: Rng + ?Sized>(
    key: &str,
    key_value: &GeneratedValue,
    samples: &[FieldSample],
    rng: &mut R,
) -> SelectPlan {
    let key_projection = Projection::new([key]);
    let mut plan = SelectPlan {
        optimized: vec![SelectQuery {
            filter: Filter::key_only(key, key_value.clone()),
            projection: key_projection.clone(),
        }],
        ineffective: vec![SelectQuery {
            filter: Filter::empty().with(key, Predicate::Exists(true)),
            projection: key_projection,
        }],
    };

    for sample in samples.iter().filter(|s| s.field != key) {
        let projection = Projection::key_and(key, &sample.field);
        for predicate in select_predicates(sample, rng) {
            plan.optimized.push(SelectQuery {
                filter: Filter::key_only(key, key_value.clone())
                    .with(&sample.field, predicate.clone()),
                projection: projection.clone(),
            });
            plan.ineffective.push(SelectQuery {
                filter: Filter::empty().with(&sample.field, predicate),
                projection: projection.clone(),
            });
        }
    }

    plan
}

/// `$inc` delta with the same numeric kind as `value`.
fn inc_delta<R: Rng + ?Sized>(value: &GeneratedValue, rng: &mut R) -> Option<GeneratedValue> {
    let delta = rng.gen_range(INC_DELTA.0..=INC_DELTA.1);
    let value = match value {
        GeneratedValue::Int32(_) => GeneratedValue::Int32(delta),
        GeneratedValue::Int64(_) => GeneratedValue::Int64(i64::from(delta)),
        GeneratedValue::Double(_) => GeneratedValue::Double(round2(f64::from(delta))),
        GeneratedValue::Decimal(_) => GeneratedValue::Decimal(format!("{delta}.00")),
        _ => return None,
    };
    Some(value)
}

/// Update operators for one field's new value.
fn update_ops<R: Rng + ?Sized>(sample: &FieldSample, rng: &mut R) -> Vec<UpdateOp> {
    let field = sample.field.clone();
    let set = UpdateOp::Set {
        field: field.clone(),
        value: sample.value.clone(),
    };

    if let Some(value) = numeric_value(sample) {
        let mut ops = vec![set];
        if let Some(delta) = inc_delta(value, rng) {
            ops.push(UpdateOp::Inc { field, delta });
        }
        return ops;
    }

    match &sample.value {
        GeneratedValue::Bool(b) => vec![
            set,
            UpdateOp::Set {
                field,
                value: GeneratedValue::Bool(!b),
            },
        ],
        GeneratedValue::Array(items) if sample.field_type == FieldType::Array => {
            let element = items
                .first()
                .cloned()
                .unwrap_or_else(|| GeneratedValue::String(words::word(rng)));
            vec![
                set,
                UpdateOp::Push {
                    field,
                    value: element,
                },
            ]
        }
        _ => vec![set],
    }
}

/// Build update candidates.
///
/// Every operator is paired: optimized targets the key, ineffective uses an
/// empty filter with the same body.
pub fn plan_update<R: Rng + ?Sized>(
    key: &str,
    key_value: &GeneratedValue,
    samples: &[FieldSample],
    rng: &mut R,
) -> UpdatePlan {
    let mut plan = UpdatePlan::default();

    for sample in samples.iter().filter(|s| s.field != key) {
        for op in update_ops(sample, rng) {
            plan.optimized.push(UpdateQuery {
                filter: Filter::key_only(key, key_value.clone()),
                ops: vec![op.clone()],
            });
            plan.ineffective.push(UpdateQuery {
                filter: Filter::empty(),
                ops: vec![op],
            });
        }
    }

    plan
}

/// Field predicates used to scope deletes.
fn delete_predicates<R: Rng + ?Sized>(sample: &FieldSample, rng: &mut R) -> Vec<Predicate> {
    if let Some(value) = numeric_value(sample) {
        let mut predicates = vec![Predicate::Gt(value.clone())];
        if let Some(upper) = range_upper(value, rng) {
            predicates.push(Predicate::Range {
                gte: value.clone(),
                lte: upper,
            });
        }
        return predicates;
    }

    match (&sample.field_type, &sample.value) {
        (FieldType::String, GeneratedValue::String(s)) => vec![Predicate::prefix(&prefix_of(s))],
        (FieldType::Array, value) => {
            let values = membership(value);
            if values.is_empty() {
                Vec::new()
            } else {
                vec![Predicate::In(values)]
            }
        }
        _ => Vec::new(),
    }
}

/// Build delete candidates.
///
/// The base pair is a key-only optimized delete and an empty-filter
/// ineffective delete.
pub fn plan_delete<R: Rng + ?Sized>(
    key: &str,
    key_value: &GeneratedValue,
    samples: &[FieldSample],
    rng: &mut R,
) -> DeletePlan {
    let mut plan = DeletePlan {
        optimized: vec![Filter::key_only(key, key_value.clone())],
        ineffective: vec![Filter::empty()],
    };

    for sample in samples.iter().filter(|s| s.field != key) {
        for predicate in delete_predicates(sample, rng) {
            plan.optimized
                .push(Filter::key_only(key, key_value.clone()).with(&sample.field, predicate.clone()));
            plan.ineffective
                .push(Filter::empty().with(&sample.field, predicate));
        }
    }

    plan
}
