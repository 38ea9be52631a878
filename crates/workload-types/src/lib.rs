//! Core types for the mongodb-workload generator.
//!
//! This crate provides the foundational types shared by the generator,
//! the BSON conversion layer and the workload engine:
//!
//! - [`FieldType`] - BSON-like type tokens declared in collection definitions
//! - [`GeneratedValue`] - Database-neutral generated values
//! - [`CollectionDefinition`] - Collection schemas loaded from JSON
//! - [`Filter`], [`UpdateOp`], [`Projection`] - Typed query specifications
//!
//! # Architecture
//!
//! ```text
//! workload-types (this crate)
//!    │
//!    ├─── workload-generator  (values, providers, documents)
//!    │
//!    ├─── mongodb-types       (implements From/Into for BSON)
//!    │
//!    └─── workload-engine     (planner, guard, workers)
//! ```
//!
//! # Example
//!
//! ```rust
//! use workload_types::{CollectionDefinition, FieldType};
//!
//! let def = CollectionDefinition::from_json(r#"{
//!     "databaseName": "airline",
//!     "collectionName": "flights",
//!     "fieldName": {
//!         "flight_id": {"type": "int", "provider": "flight_id"},
//!         "gate": {"type": "string", "provider": "gate"}
//!     },
//!     "shardConfig": {"key": {"flight_id": 1}}
//! }"#).unwrap();
//!
//! assert_eq!(def.primary_key(), "flight_id");
//! assert_eq!(def.field_type("gate"), FieldType::String);
//! ```

pub mod operation;
pub mod query;
pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use operation::{OperationKind, QueryMode};
pub use query::{Filter, Predicate, Projection, UpdateOp};
pub use schema::{
    CollectionDefinition, FieldDefinition, IndexDefinition, KeyDirection, Namespace, OrderedMap,
    SchemaError, ShardConfig, DEFAULT_ID_FIELD,
};
pub use types::FieldType;
pub use values::{GeneratedDocument, GeneratedValue};
