//! Nearest-neighbor criterion
//!
//! A [`Similarity`] names a vector field and a query vector. The metric
//! defaults to the one declared by the field and can be overridden.

use crate::error::{StoreError, StoreResult};
use crate::schema::{CollectionSchema, FieldType};
use crate::types::DistanceMetric;

/// Nearest-neighbor criterion over one vector field
#[derive(Debug, Clone, PartialEq)]
pub struct Similarity {
    collection: String,
    field: String,
    vector: Vec<f32>,
    metric: Option<DistanceMetric>,
}

impl Similarity {
    /// Build a criterion, validating the field and the query length
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the field is unknown, is not a vector field, or
    /// the query length differs from the field dimension.
    pub fn new(
        schema: &CollectionSchema,
        field: &str,
        vector: impl Into<Vec<f32>>,
    ) -> StoreResult<Self> {
        let (_, def) = schema.require_field(field)?;
        let FieldType::Vector { dimension, .. } = def.field_type else {
            return Err(StoreError::schema(format!(
                "Field {} in {} is not a vector field",
                def.name,
                schema.name()
            )));
        };
        let vector = vector.into();
        if vector.len() != dimension {
            return Err(StoreError::schema(format!(
                "Expected vector of length {}, got {}",
                dimension,
                vector.len()
            )));
        }
        Ok(Similarity {
            collection: schema.name().to_string(),
            field: def.name.clone(),
            vector,
            metric: None,
        })
    }

    /// Override the field's declared metric
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Collection the criterion is scoped to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Vector field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Query vector
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// Metric override, if any
    pub fn metric(&self) -> Option<DistanceMetric> {
        self.metric
    }

    /// Metric used for ranking: the override, else the field's metric
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the schema does not declare the vector field.
    pub fn effective_metric(&self, schema: &CollectionSchema) -> StoreResult<DistanceMetric> {
        if let Some(metric) = self.metric {
            return Ok(metric);
        }
        match schema.require_field(&self.field)?.1.field_type {
            FieldType::Vector { metric, .. } => Ok(metric),
            other => Err(StoreError::schema(format!(
                "Field {} is {}, not Vector",
                self.field,
                other.name()
            ))),
        }
    }
}
