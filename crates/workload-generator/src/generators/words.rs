//! Word pools for text generation.

use rand::seq::SliceRandom;
use rand::Rng;

pub const WORDS: &[&str] = &[
    "alias", "amet", "animi", "aperiam", "atque", "autem", "beatae", "blanditiis", "commodi",
    "consequatur", "corporis", "culpa", "cumque", "debitis", "delectus", "dicta", "dolor",
    "dolore", "dolorem", "ducimus", "eaque", "earum", "eius", "eligendi", "enim", "error",
    "esse", "eveniet", "excepturi", "expedita", "explicabo", "facere", "facilis", "fuga",
    "fugiat", "harum", "hic", "illo", "impedit", "incidunt", "ipsa", "ipsum", "itaque", "iure",
    "labore", "laborum", "laudantium", "libero", "magnam", "magni", "maiores", "maxime",
    "minima", "minus", "modi", "molestiae", "mollitia", "nam", "natus", "neque", "nihil",
    "nobis", "nostrum", "nulla", "numquam", "odio", "officia", "omnis", "optio", "pariatur",
    "perferendis", "placeat", "porro", "possimus", "praesentium", "provident", "quae", "quam",
    "quas", "quia", "quibusdam", "quidem", "quis", "quisquam", "quod", "ratione", "recusandae",
    "rem", "rerum", "saepe", "sapiente", "sequi", "similique", "sint", "sit", "soluta", "sunt",
    "tempora", "tempore", "tenetur", "totam", "ullam", "unde", "vel", "velit", "veniam",
    "veritatis", "vero", "vitae", "voluptas", "voluptate", "voluptatem",
];

pub const FIRST_NAMES: &[&str] = &[
    "Aaron", "Abigail", "Adam", "Alicia", "Amanda", "Andrew", "Angela", "Anthony", "Ashley",
    "Benjamin", "Brandon", "Brian", "Catherine", "Charles", "Christina", "Christopher", "Daniel",
    "David", "Deborah", "Diana", "Edward", "Elizabeth", "Emily", "Eric", "Frank", "Gregory",
    "Hannah", "Heather", "Jacob", "James", "Jason", "Jennifer", "Jessica", "John", "Joseph",
    "Joshua", "Karen", "Kevin", "Laura", "Linda", "Lisa", "Madison", "Maria", "Mark", "Matthew",
    "Megan", "Michael", "Michelle", "Nancy", "Nicholas", "Olivia", "Patricia", "Paul", "Rachel",
    "Rebecca", "Richard", "Robert", "Ryan", "Samantha", "Sandra", "Sarah", "Scott", "Stephanie",
    "Steven", "Susan", "Thomas", "Timothy", "Victoria", "William", "Zachary",
];

pub const LAST_NAMES: &[&str] = &[
    "Adams", "Allen", "Anderson", "Baker", "Bell", "Brown", "Campbell", "Carter", "Clark",
    "Collins", "Cook", "Davis", "Edwards", "Evans", "Garcia", "Gonzalez", "Green", "Hall",
    "Harris", "Hernandez", "Hill", "Jackson", "Johnson", "Jones", "King", "Lee", "Lewis",
    "Lopez", "Martin", "Martinez", "Miller", "Mitchell", "Moore", "Morgan", "Murphy", "Nelson",
    "Parker", "Perez", "Phillips", "Roberts", "Robinson", "Rodriguez", "Scott", "Smith",
    "Stewart", "Taylor", "Thomas", "Thompson", "Turner", "Walker", "White", "Williams", "Wilson",
    "Wright", "Young",
];

pub const CITIES: &[&str] = &[
    "Amsterdam", "Athens", "Atlanta", "Austin", "Barcelona", "Berlin", "Boston", "Brussels",
    "Chicago", "Copenhagen", "Dallas", "Denver", "Dublin", "Frankfurt", "Geneva", "Hamburg",
    "Helsinki", "Houston", "Lisbon", "London", "Madrid", "Melbourne", "Miami", "Milan",
    "Montreal", "Munich", "Oslo", "Paris", "Prague", "Rome", "Seattle", "Singapore",
    "Stockholm", "Sydney", "Tokyo", "Toronto", "Vienna", "Warsaw", "Zurich",
];

pub const COUNTRIES: &[&str] = &[
    "Argentina", "Australia", "Austria", "Belgium", "Brazil", "Canada", "Chile", "Denmark",
    "Egypt", "Finland", "France", "Germany", "Greece", "India", "Ireland", "Italy", "Japan",
    "Kenya", "Mexico", "Netherlands", "New Zealand", "Norway", "Peru", "Poland", "Portugal",
    "Singapore", "South Africa", "Spain", "Sweden", "Switzerland", "United Kingdom",
    "United States",
];

pub const COMPANY_SUFFIXES: &[&str] = &["Inc", "LLC", "Group", "Ltd", "PLC", "and Sons"];

pub const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

/// Pick one entry from a non-empty pool.
pub fn pick<'a, R: Rng + ?Sized>(rng: &mut R, pool: &[&'a str]) -> &'a str {
    pool.choose(rng).copied().unwrap_or_default()
}

/// A random lorem word.
pub fn word<R: Rng + ?Sized>(rng: &mut R) -> String {
    pick(rng, WORDS).to_string()
}

/// A short capitalised sentence of 4 to 10 words ending in a period.
pub fn sentence<R: Rng + ?Sized>(rng: &mut R) -> String {
    let count = rng.gen_range(4..=10);
    let words: Vec<&str> = (0..count).map(|_| pick(rng, WORDS)).collect();
    let mut text = words.join(" ");
    if let Some(first) = text.get(0..1) {
        let upper = first.to_uppercase();
        text.replace_range(0..1, &upper);
    }
    text.push('.');
    text
}

/// "First Last"
pub fn full_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES))
}
