//! Collection schemas
//!
//! A [`CollectionSchema`] declares a named record type: an ordered list of
//! uniquely named fields, each with a scalar or vector type. Schemas are
//! built explicitly through [`SchemaBuilder`] registration calls and shared
//! behind an `Arc` by every record of the collection.
//!
//! ```
//! use affine_core::{CollectionSchema, DistanceMetric, FieldType};
//!
//! let person = CollectionSchema::builder("Person")
//!     .field("name", FieldType::String)
//!     .field("age", FieldType::Int)
//!     .vector("embedding", 2, DistanceMetric::Euclidean)
//!     .build()
//!     .unwrap();
//! assert_eq!(person.len(), 3);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::types::DistanceMetric;
use crate::value::Value;

/// Maximum collection name length in bytes
pub const MAX_COLLECTION_NAME_LENGTH: usize = 256;

/// Semantic type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// 64-bit signed integer
    Int,
    /// 64-bit float (integers are widened on construction)
    Float,
    /// UTF-8 string
    String,
    /// Boolean
    Bool,
    /// Fixed-dimension embedding compared with the given metric
    Vector {
        /// Number of components, > 0
        dimension: usize,
        /// Metric used for similarity queries unless overridden
        metric: DistanceMetric,
    },
}

impl FieldType {
    /// Check if this is a vector type
    pub fn is_vector(&self) -> bool {
        matches!(self, FieldType::Vector { .. })
    }

    /// Human-readable name for error messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::String => "String",
            FieldType::Bool => "Bool",
            FieldType::Vector { .. } => "Vector",
        }
    }

    /// Whether a value of this kind can be compared against the field
    pub(crate) fn is_comparable_with(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (FieldType::Int | FieldType::Float, Value::Int(_) | Value::Float(_))
                | (FieldType::String, Value::String(_))
                | (FieldType::Bool, Value::Bool(_))
                | (FieldType::Vector { .. }, Value::Vector(_))
        )
    }
}

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name, unique within the schema
    pub name: String,
    /// Field type
    pub field_type: FieldType,
}

/// Declared record type of a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    name: String,
    fields: Vec<FieldDef>,
}

impl CollectionSchema {
    /// Start declaring a collection
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the schema declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field in declaration order
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Look up a field definition
    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field definition, failing with a schema error
    pub fn require_field(&self, name: &str) -> StoreResult<(usize, &FieldDef)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .ok_or_else(|| {
                StoreError::schema(format!("Field {} not in {}", name, self.name))
            })
    }

    /// Vector fields in declaration order
    pub fn vector_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.field_type.is_vector())
    }

    /// Re-check the structural invariants (used after deserialization)
    pub fn validate(&self) -> StoreResult<()> {
        validate_collection_name(&self.name)?;
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(StoreError::schema(format!(
                    "Field names in {} cannot be empty",
                    self.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(StoreError::schema(format!(
                    "Duplicate field {} in {}",
                    field.name, self.name
                )));
            }
            if let FieldType::Vector { dimension: 0, .. } = field.field_type {
                return Err(StoreError::schema(format!(
                    "Vector field {} must have dimension > 0",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Validate values aligned with the field order
    ///
    /// Absent values are tolerated only for vector fields, and only when
    /// `allow_absent_vectors` is set (projections that omit vectors).
    pub fn validate_values(
        &self,
        values: &[Option<Value>],
        allow_absent_vectors: bool,
    ) -> StoreResult<()> {
        if values.len() != self.fields.len() {
            return Err(StoreError::schema(format!(
                "{} expects {} fields, got {}",
                self.name,
                self.fields.len(),
                values.len()
            )));
        }
        for (field, value) in self.fields.iter().zip(values) {
            match value {
                None if allow_absent_vectors && field.field_type.is_vector() => {}
                None => {
                    return Err(StoreError::schema(format!(
                        "Missing value for field {} in {}",
                        field.name, self.name
                    )))
                }
                Some(value) => check_value(field, value)?,
            }
        }
        Ok(())
    }
}

fn check_value(field: &FieldDef, value: &Value) -> StoreResult<()> {
    match (&field.field_type, value) {
        (FieldType::Int, Value::Int(_))
        | (FieldType::Float, Value::Float(_))
        | (FieldType::String, Value::String(_))
        | (FieldType::Bool, Value::Bool(_)) => Ok(()),
        (FieldType::Vector { dimension, .. }, Value::Vector(v)) => {
            if v.len() != *dimension {
                Err(StoreError::schema(format!(
                    "Expected vector of length {}, got {}",
                    dimension,
                    v.len()
                )))
            } else {
                Ok(())
            }
        }
        (expected, got) => Err(StoreError::schema(format!(
            "Field {} expects {}, got {}",
            field.name,
            expected.name(),
            got.type_name()
        ))),
    }
}

/// Registration-style schema declaration
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    /// Register a field
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            field_type,
        });
        self
    }

    /// Register a vector field
    pub fn vector(self, name: impl Into<String>, dimension: usize, metric: DistanceMetric) -> Self {
        self.field(name, FieldType::Vector { dimension, metric })
    }

    /// Finish the declaration
    ///
    /// # Errors
    ///
    /// Returns a schema error for an invalid collection name, an empty or
    /// duplicate field name, or a zero vector dimension.
    pub fn build(self) -> StoreResult<Arc<CollectionSchema>> {
        let schema = CollectionSchema {
            name: self.name,
            fields: self.fields,
        };
        schema.validate()?;
        Ok(Arc::new(schema))
    }
}

/// Validate a collection name
///
/// # Validation Rules
/// - Cannot be empty
/// - Cannot exceed 256 characters
/// - Cannot contain '/' or null bytes
/// - Cannot start with '_' (reserved)
pub fn validate_collection_name(name: &str) -> StoreResult<()> {
    let reason = if name.is_empty() {
        Some("cannot be empty".to_string())
    } else if name.len() > MAX_COLLECTION_NAME_LENGTH {
        Some(format!(
            "cannot exceed {} characters",
            MAX_COLLECTION_NAME_LENGTH
        ))
    } else if name.contains('/') {
        Some("cannot contain '/'".to_string())
    } else if name.contains('\0') {
        Some("cannot contain null bytes".to_string())
    } else if name.starts_with('_') {
        Some("names starting with '_' are reserved".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::schema(format!(
            "Invalid collection name '{}': {}",
            name, reason
        ))),
        None => Ok(()),
    }
}
