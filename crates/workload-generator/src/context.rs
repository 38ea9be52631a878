//! Per-document generation context.
//!
//! Some fields only make sense together: the passenger list must fit the
//! aircraft, and `seats_available` must equal `total_seats - num_passengers`.
//! A [`GenerationContext`] is drawn once per document (or per update) and read
//! by the context-aware providers and the context-field post-pass.

use rand::seq::SliceRandom;
use rand::Rng;
use workload_types::GeneratedValue;

/// Aircraft types and their seat counts.
pub const AIRCRAFT_SEAT_MAP: &[(&str, i32)] = &[
    ("Airbus A320", 170),
    ("Boeing 737", 160),
    ("CRJ 1000", 100),
    ("Embraer E190", 90),
    ("Dash 8-400", 85),
    ("ATR-72", 75),
    ("ERJ-145", 50),
];

/// Field names filled from the context when declared without a provider.
pub const CONTEXT_FIELDS: [&str; 4] = [
    "plane_type",
    "total_seats",
    "num_passengers",
    "seats_available",
];

/// Upper bound on generated passengers.
pub const MAX_PASSENGERS: i32 = 70;

pub const DEFAULT_PLANE_TYPE: &str = "Airbus A320";
pub const DEFAULT_TOTAL_SEATS: i32 = 100;
pub const DEFAULT_NUM_PASSENGERS: i32 = 10;
pub const DEFAULT_SEATS_AVAILABLE: i32 = 0;

/// Whether `field` is one of the context field names.
pub fn is_context_field(field: &str) -> bool {
    CONTEXT_FIELDS.contains(&field)
}

/// Transient values shared by the fields of one generated document.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationContext {
    pub plane_type: String,
    pub total_seats: i32,
    pub num_passengers: i32,
    pub seats_available: i32,
}

impl GenerationContext {
    /// Draw an aircraft and a passenger count that fits it.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (plane_type, total_seats) = AIRCRAFT_SEAT_MAP
            .choose(rng)
            .copied()
            .unwrap_or((DEFAULT_PLANE_TYPE, DEFAULT_TOTAL_SEATS));
        let num_passengers = rng.gen_range(1..=MAX_PASSENGERS.min(total_seats));

        Self {
            plane_type: plane_type.to_string(),
            total_seats,
            num_passengers,
            seats_available: total_seats - num_passengers,
        }
    }

    /// Value of a context field by name.
    pub fn get(&self, field: &str) -> Option<GeneratedValue> {
        match field {
            "plane_type" => Some(GeneratedValue::String(self.plane_type.clone())),
            "total_seats" => Some(GeneratedValue::Int32(self.total_seats)),
            "num_passengers" => Some(GeneratedValue::Int32(self.num_passengers)),
            "seats_available" => Some(GeneratedValue::Int32(self.seats_available)),
            _ => None,
        }
    }
}
