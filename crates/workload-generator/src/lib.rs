//! Synthetic data generation for the mongodb-workload generator.
//!
//! This crate turns a [`CollectionDefinition`](workload_types::CollectionDefinition)
//! into documents and replacement values:
//!
//! ```text
//! CollectionDefinition (JSON)
//!        │
//!        ▼
//! ┌────────────────────┐     ┌──────────────────┐
//! │ DocumentGenerator  │────▶│ ProviderRegistry │
//! │                    │     └──────────────────┘
//! │  - by type         │     ┌──────────────────┐
//! │  - by provider     │────▶│ GenerationContext│
//! │  - context fields  │     └──────────────────┘
//! └─────────┬──────────┘
//!           │
//!           ▼
//!   GeneratedDocument { field: GeneratedValue }
//! ```
//!
//! # Example
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use workload_generator::DocumentGenerator;
//! use workload_types::CollectionDefinition;
//!
//! let def = CollectionDefinition::from_json(r#"{
//!     "databaseName": "airline",
//!     "collectionName": "flights",
//!     "fieldName": {
//!         "flight_id": {"type": "int", "provider": "flight_id"},
//!         "gate": {"type": "string", "provider": "gate"}
//!     }
//! }"#).unwrap();
//!
//! let generator = DocumentGenerator::default();
//! let mut rng = StdRng::seed_from_u64(42);
//! let doc = generator.generate_for_insert(&def, def.primary_key(), false, &mut rng);
//! assert!(doc.contains_key("gate"));
//! ```
//!
//! # Types
//!
//! | Type        | Value                                   |
//! |-------------|-----------------------------------------|
//! | `string`    | random word                             |
//! | `int`       | 1 to 10000                              |
//! | `double`    | 10.0 to 10000.0, 2 decimals             |
//! | `bool`      | true or false                           |
//! | `date`      | instant between 1970-01-01 and now      |
//! | `objectId`  | fresh 12-byte id                        |
//! | `array`     | 1 to 3 words                            |
//! | `object`    | `{"randomKey": word}`                    |
//! | `timestamp` | now                                     |
//! | `long`      | 10000000000 to 99999999999              |
//! | `decimal`   | 0.1 to 9999.99, 2 decimals              |

pub mod context;
pub mod document;
pub mod generators;
pub mod providers;

// Re-exports for convenience
pub use context::{GenerationContext, AIRCRAFT_SEAT_MAP, CONTEXT_FIELDS};
pub use document::DocumentGenerator;
pub use generators::generate_for_type;
pub use providers::{GeneratorError, Provider, ProviderRegistry};
