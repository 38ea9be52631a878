//! Numeric value generators.

use rand::Rng;
use workload_types::values::round2;
use workload_types::GeneratedValue;

pub const INT_RANGE: (i32, i32) = (1, 10_000);
pub const DOUBLE_RANGE: (f64, f64) = (10.0, 10_000.0);
pub const LONG_RANGE: (i64, i64) = (10_000_000_000, 99_999_999_999);
pub const DECIMAL_RANGE: (f64, f64) = (0.1, 9_999.99);

/// Random `int` in [1, 10000].
pub fn generate_int<R: Rng + ?Sized>(rng: &mut R) -> GeneratedValue {
    GeneratedValue::Int32(rng.gen_range(INT_RANGE.0..=INT_RANGE.1))
}

/// Random `long` in [10000000000, 99999999999].
pub fn generate_long<R: Rng + ?Sized>(rng: &mut R) -> GeneratedValue {
    GeneratedValue::Int64(rng.gen_range(LONG_RANGE.0..=LONG_RANGE.1))
}

/// Random `double` in [10.0, 10000.0], rounded to 2 decimals.
pub fn generate_double<R: Rng + ?Sized>(rng: &mut R) -> GeneratedValue {
    GeneratedValue::Double(round2(rng.gen_range(DOUBLE_RANGE.0..=DOUBLE_RANGE.1)))
}

/// Random `decimal` in [0.1, 9999.99] with 2 decimal places.
///
/// The decimal is stored as a string and becomes a Decimal128 at the
/// store boundary.
pub fn generate_decimal<R: Rng + ?Sized>(rng: &mut R) -> GeneratedValue {
    let value = rng.gen_range(DECIMAL_RANGE.0..=DECIMAL_RANGE.1);
    GeneratedValue::Decimal(format!("{value:.2}"))
}
