//! Date and timestamp generators.

use chrono::{DateTime, Utc};
use rand::Rng;
use workload_types::GeneratedValue;

/// Random instant between the Unix epoch and now, at second precision.
pub fn generate_date<R: Rng + ?Sized>(rng: &mut R) -> GeneratedValue {
    let now = Utc::now().timestamp();
    let secs = rng.gen_range(0..=now.max(0));
    GeneratedValue::DateTime(DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now))
}

/// The current UTC time.
///
/// This is NOT deterministic - each call returns the current time.
pub fn generate_timestamp_now() -> GeneratedValue {
    GeneratedValue::DateTime(Utc::now())
}
