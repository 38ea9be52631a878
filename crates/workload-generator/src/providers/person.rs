//! General-purpose providers: people, places, text and identifiers.

use super::ProviderRegistry;
use crate::generators::{temporal, words};
use rand::{Rng, RngCore};
use uuid::Uuid;
use workload_types::GeneratedValue;

pub(super) fn register(registry: &mut ProviderRegistry) {
    registry.register_fn("name", |rng| words::full_name(rng).into());
    registry.register_fn("first_name", |rng| words::pick(rng, words::FIRST_NAMES).into());
    registry.register_fn("last_name", |rng| words::pick(rng, words::LAST_NAMES).into());
    registry.register_fn("email", email);
    registry.register_fn("word", |rng| words::word(rng).into());
    registry.register_fn("sentence", |rng| words::sentence(rng).into());
    registry.register_fn("city", |rng| words::pick(rng, words::CITIES).into());
    registry.register_fn("country", |rng| words::pick(rng, words::COUNTRIES).into());
    registry.register_fn("company", company);
    registry.register_fn("phone_number", phone_number);
    registry.register_fn("uuid4", uuid4);
    registry.register_fn("date_time", |rng| temporal::generate_date(rng));
}

fn email(rng: &mut dyn RngCore) -> GeneratedValue {
    let first = words::pick(rng, words::FIRST_NAMES).to_lowercase();
    let last = words::pick(rng, words::LAST_NAMES).to_lowercase();
    let n: u16 = rng.gen_range(1..=999);
    let domain = words::pick(rng, words::EMAIL_DOMAINS);
    format!("{first}.{last}{n}@{domain}").into()
}

fn company(rng: &mut dyn RngCore) -> GeneratedValue {
    let last = words::pick(rng, words::LAST_NAMES);
    let suffix = words::pick(rng, words::COMPANY_SUFFIXES);
    format!("{last} {suffix}").into()
}

fn phone_number(rng: &mut dyn RngCore) -> GeneratedValue {
    let area: u16 = rng.gen_range(200..=999);
    let exchange: u16 = rng.gen_range(200..=999);
    let line: u16 = rng.gen_range(0..=9999);
    format!("+1-{area}-{exchange}-{line:04}").into()
}

/// Random UUID v4 as a hyphenated string.
fn uuid4(rng: &mut dyn RngCore) -> GeneratedValue {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);

    // Set version (4) and variant (RFC 4122) bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes).to_string().into()
}
