//! Records
//!
//! A [`Record`] is one row of a collection. Values are stored aligned with
//! the schema's field order. The id is `None` until the record is inserted
//! into an engine, which attaches it exactly once.

use std::fmt;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::schema::{CollectionSchema, FieldType};
use crate::types::RecordId;
use crate::value::Value;

/// A schema-typed record
#[derive(Clone)]
pub struct Record {
    schema: Arc<CollectionSchema>,
    id: Option<RecordId>,
    values: Vec<Option<Value>>,
}

impl Record {
    /// Start building a record of the given collection
    pub fn builder(schema: &Arc<CollectionSchema>) -> RecordBuilder {
        RecordBuilder {
            schema: Arc::clone(schema),
            values: vec![None; schema.len()],
            error: None,
        }
    }

    /// Reassemble a record from stored parts (snapshot restore)
    ///
    /// The values are fully validated; absent values are rejected.
    pub fn from_parts(
        schema: Arc<CollectionSchema>,
        id: Option<RecordId>,
        values: Vec<Option<Value>>,
    ) -> StoreResult<Self> {
        schema.validate_values(&values, false)?;
        Ok(Record { schema, id, values })
    }

    /// Collection this record belongs to
    pub fn collection(&self) -> &str {
        self.schema.name()
    }

    /// Schema of the collection
    pub fn schema(&self) -> &Arc<CollectionSchema> {
        &self.schema
    }

    /// Assigned id, `None` before insertion
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Attach the id assigned on insertion
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the record already carries an id.
    pub fn with_id(mut self, id: RecordId) -> StoreResult<Self> {
        if let Some(existing) = self.id {
            return Err(StoreError::invalid_argument(format!(
                "Record in {} already has id {}",
                self.collection(),
                existing
            )));
        }
        self.id = Some(id);
        Ok(self)
    }

    /// Get a field value by name
    ///
    /// Returns None for unknown fields and for vectors omitted by a projection.
    pub fn get(&self, field: &str) -> Option<&Value> {
        let index = self.schema.field_index(field)?;
        self.values[index].as_ref()
    }

    /// Get a vector field by name
    pub fn vector(&self, field: &str) -> Option<&[f32]> {
        self.get(field).and_then(Value::as_vector)
    }

    /// Values aligned with the schema's field order
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// `(field name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(f, v)| (f.name.as_str(), v.as_ref()))
    }

    /// Decompose into id and values
    pub fn into_parts(self) -> (Option<RecordId>, Vec<Option<Value>>) {
        (self.id, self.values)
    }

    /// Check that every field holds a well-typed value
    pub fn validate(&self) -> StoreResult<()> {
        self.schema.validate_values(&self.values, false)
    }

    /// Check whether any vector field was omitted by a projection
    pub fn is_projected(&self) -> bool {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .any(|(f, v)| f.field_type.is_vector() && v.is_none())
    }

    /// Projection that drops every vector value
    ///
    /// The only way to obtain a record with absent values. Remote engines
    /// honoring `with_vectors = false` return records shaped like this.
    pub fn without_vectors(&self) -> Record {
        let values = self
            .schema
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(f, v)| if f.field_type.is_vector() { None } else { v.clone() })
            .collect();
        Record {
            schema: Arc::clone(&self.schema),
            id: self.id,
            values,
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name() == other.schema.name()
            && self.id == other.id
            && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        s.field("id", &self.id);
        for (name, value) in self.iter() {
            s.field(name, &value);
        }
        s.finish()
    }
}

/// Field-by-field record construction
#[derive(Debug)]
pub struct RecordBuilder {
    schema: Arc<CollectionSchema>,
    values: Vec<Option<Value>>,
    error: Option<StoreError>,
}

impl RecordBuilder {
    /// Set a field value
    ///
    /// Unknown field names are reported by [`RecordBuilder::build`].
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match self.schema.require_field(field) {
            Ok((index, def)) => {
                let value = value.into();
                // Integers are widened for float fields
                let value = match (def.field_type, value) {
                    (FieldType::Float, Value::Int(i)) => Value::Float(i as f64),
                    (_, value) => value,
                };
                self.values[index] = Some(value);
            }
            Err(e) => self.error = Some(e),
        }
        self
    }

    /// Validate and produce the record
    ///
    /// # Errors
    ///
    /// Returns a schema error for an unknown field, a missing field, a
    /// mistyped value, or a vector whose length differs from the dimension.
    pub fn build(self) -> StoreResult<Record> {
        if let Some(e) = self.error {
            return Err(e);
        }
        Record::from_parts(self.schema, None, self.values)
    }
}

impl CollectionSchema {
    /// Start building a record of this collection
    pub fn record(self: &Arc<Self>) -> RecordBuilder {
        Record::builder(self)
    }
}
