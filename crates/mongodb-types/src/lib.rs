//! MongoDB/BSON conversions for mongodb-workload types.
//!
//! This crate converts between `workload-types` values and query
//! specifications and MongoDB's BSON types.
//!
//! # Modules
//!
//! - [`forward`] - GeneratedValue, Filter, UpdateOp, Projection → BSON
//! - [`reverse`] - BSON → GeneratedValue
//!
//! # Example
//!
//! ```rust
//! use mongodb_types::{filter_to_document, BsonValue};
//! use workload_types::{Filter, GeneratedValue};
//!
//! let bson_val: BsonValue = GeneratedValue::Int32(7).into();
//! assert_eq!(bson_val.into_inner(), bson::Bson::Int32(7));
//!
//! let filter = Filter::key_only("flight_id", GeneratedValue::Int32(7));
//! assert_eq!(filter_to_document(&filter), bson::doc! { "flight_id": 7 });
//! ```

pub mod forward;
pub mod reverse;

pub use forward::{
    document_to_bson, filter_to_document, key_spec_to_document, predicate_to_bson,
    projection_to_document, update_to_document, BsonValue,
};
pub use reverse::{bson_to_generated, document_to_generated};
