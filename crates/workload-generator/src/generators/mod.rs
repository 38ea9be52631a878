//! Type-driven value generators.
//!
//! Every [`FieldType`] maps to one generator. Unknown type tokens generate
//! null so that a definition with a typo still produces documents.

pub mod numeric;
pub mod temporal;
pub mod words;

use rand::Rng;
use std::collections::BTreeMap;
use workload_types::{FieldType, GeneratedValue};

/// Generate one fresh value for a declared type.
pub fn generate_for_type<R: Rng + ?Sized>(field_type: &FieldType, rng: &mut R) -> GeneratedValue {
    match field_type {
        FieldType::String => GeneratedValue::String(words::word(rng)),

        FieldType::Int => numeric::generate_int(rng),

        FieldType::Double => numeric::generate_double(rng),

        FieldType::Bool => GeneratedValue::Bool(rng.gen_bool(0.5)),

        FieldType::Date => temporal::generate_date(rng),

        FieldType::ObjectId => generate_object_id(rng),

        FieldType::Array => generate_word_array(rng),

        FieldType::Object => {
            let mut map = BTreeMap::new();
            map.insert(
                "randomKey".to_string(),
                GeneratedValue::String(words::word(rng)),
            );
            GeneratedValue::Object(map)
        }

        FieldType::Timestamp => temporal::generate_timestamp_now(),

        FieldType::Long => numeric::generate_long(rng),

        FieldType::Decimal => numeric::generate_decimal(rng),

        FieldType::Unknown(_) => GeneratedValue::Null,
    }
}

/// Generate a fresh 12-byte object id.
pub fn generate_object_id<R: Rng + ?Sized>(rng: &mut R) -> GeneratedValue {
    let mut bytes = [0u8; 12];
    rng.fill(&mut bytes);
    GeneratedValue::ObjectId(bytes)
}

/// Generate an array of 1 to 3 random words.
pub fn generate_word_array<R: Rng + ?Sized>(rng: &mut R) -> GeneratedValue {
    let len = rng.gen_range(1..=3);
    GeneratedValue::Array(
        (0..len)
            .map(|_| GeneratedValue::String(words::word(rng)))
            .collect(),
    )
}
