//! Core types for Affine
//!
//! This crate defines the data model shared by every other crate:
//! - StoreError: error taxonomy
//! - RecordId / DistanceMetric: identity and metric types
//! - Value: field values
//! - CollectionSchema: typed collection declarations
//! - Record: schema-typed rows
//! - Filter / FilterSet / FieldRef: filter algebra
//! - Similarity: nearest-neighbor criterion

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod filter;
pub mod record;
pub mod schema;
pub mod similarity;
pub mod types;
pub mod value;

pub use error::{StoreError, StoreResult};
pub use filter::{FieldRef, Filter, FilterOp, FilterSet, LOOKUP_SEPARATOR};
pub use record::{Record, RecordBuilder};
pub use schema::{
    validate_collection_name, CollectionSchema, FieldDef, FieldType, SchemaBuilder,
    MAX_COLLECTION_NAME_LENGTH,
};
pub use similarity::Similarity;
pub use types::{DistanceMetric, RecordId};
pub use value::Value;
