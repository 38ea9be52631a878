//! Airline domain providers.
//!
//! `passengers`, `equip`, `total_seats` and `seats_available` are
//! context-aware: they read the aircraft drawn for the current document so the
//! passenger list, equipment record and seat counts agree with each other.

use super::{Provider, ProviderRegistry};
use crate::context::{
    GenerationContext, AIRCRAFT_SEAT_MAP, DEFAULT_NUM_PASSENGERS, DEFAULT_PLANE_TYPE,
    DEFAULT_SEATS_AVAILABLE, DEFAULT_TOTAL_SEATS,
};
use crate::generators::words;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use std::collections::BTreeMap;
use workload_types::GeneratedValue;

const SEAT_LETTERS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
const TICKET_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const AMENITIES: [&str; 3] = ["WiFi", "TV", "Power outlets"];

pub(super) fn register(registry: &mut ProviderRegistry) {
    registry.register_fn("flight_id", |rng| GeneratedValue::Int32(rng.gen_range(0..=9_999_999)));
    registry.register_fn("flight_code", |rng| {
        format!("FLT-{}", rng.gen_range(100..=999)).into()
    });
    registry.register_fn("gate", gate);
    registry.register_fn("ticket_number", |rng| ticket_number(rng).into());
    registry.register_fn("aircraft_type", |rng| {
        AIRCRAFT_SEAT_MAP
            .choose(rng)
            .map(|(plane, _)| GeneratedValue::from(*plane))
            .unwrap_or(GeneratedValue::Null)
    });
    registry.register("passengers", Passengers);
    registry.register("equip", Equipment);
    registry.register("total_seats", TotalSeats);
    registry.register("seats_available", SeatsAvailable);
}

/// Gate as a letter plus a number 1-10, e.g. `C7`.
fn gate(rng: &mut dyn RngCore) -> GeneratedValue {
    let letter = char::from(rng.gen_range(b'A'..=b'Z'));
    format!("{letter}{}", rng.gen_range(1..=10)).into()
}

/// PNR-like ticket: 10 uppercase letters or digits.
pub fn ticket_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..10)
        .map(|_| char::from(TICKET_ALPHABET[rng.gen_range(0..TICKET_ALPHABET.len())]))
        .collect()
}

/// Passenger records sized to the context's passenger count.
pub struct Passengers;

impl Provider for Passengers {
    fn generate(&self, rng: &mut dyn RngCore, ctx: Option<&GenerationContext>) -> GeneratedValue {
        let (total_seats, num_passengers) = ctx
            .map(|c| (c.total_seats, c.num_passengers))
            .unwrap_or((DEFAULT_TOTAL_SEATS, DEFAULT_NUM_PASSENGERS));
        let rows = (total_seats / 3).max(1);

        let passengers = (1..=num_passengers)
            .map(|id| {
                let letter = SEAT_LETTERS[rng.gen_range(0..SEAT_LETTERS.len())];
                let seat_number = format!("{}{letter}", rng.gen_range(1..=rows));

                let mut record = BTreeMap::new();
                record.insert("passenger_id".to_string(), GeneratedValue::Int32(id));
                record.insert("name".to_string(), words::full_name(rng).into());
                record.insert("seat_number".to_string(), seat_number.into());
                record.insert("ticket_number".to_string(), ticket_number(rng).into());
                GeneratedValue::Object(record)
            })
            .collect();
        GeneratedValue::Array(passengers)
    }

    fn needs_context(&self) -> bool {
        true
    }
}

/// Equipment record for the context's aircraft.
pub struct Equipment;

impl Provider for Equipment {
    fn generate(&self, _rng: &mut dyn RngCore, ctx: Option<&GenerationContext>) -> GeneratedValue {
        let (plane_type, total_seats) = ctx
            .map(|c| (c.plane_type.as_str(), c.total_seats))
            .unwrap_or((DEFAULT_PLANE_TYPE, DEFAULT_TOTAL_SEATS));

        let mut record = BTreeMap::new();
        record.insert("plane_type".to_string(), plane_type.into());
        record.insert("total_seats".to_string(), GeneratedValue::Int32(total_seats));
        record.insert(
            "amenities".to_string(),
            GeneratedValue::Array(AMENITIES.iter().map(|a| GeneratedValue::from(*a)).collect()),
        );
        GeneratedValue::Object(record)
    }

    fn needs_context(&self) -> bool {
        true
    }
}

pub struct TotalSeats;

impl Provider for TotalSeats {
    fn generate(&self, _rng: &mut dyn RngCore, ctx: Option<&GenerationContext>) -> GeneratedValue {
        GeneratedValue::Int32(ctx.map_or(DEFAULT_TOTAL_SEATS, |c| c.total_seats))
    }

    fn needs_context(&self) -> bool {
        true
    }
}

pub struct SeatsAvailable;

impl Provider for SeatsAvailable {
    fn generate(&self, _rng: &mut dyn RngCore, ctx: Option<&GenerationContext>) -> GeneratedValue {
        GeneratedValue::Int32(ctx.map_or(DEFAULT_SEATS_AVAILABLE, |c| c.seats_available))
    }

    fn needs_context(&self) -> bool {
        true
    }
}
