//! Snapshot data model
//!
//! A snapshot is the whole record store: collection name to schema plus the
//! ordered records of that collection. Records keep their assigned id and
//! every field value; vector components are stored as `f32` and round-trip
//! bit for bit.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use affine_core::{CollectionSchema, Record, RecordId, StoreError, StoreResult, Value};
use serde::{Deserialize, Serialize};

/// One stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Assigned id
    pub id: RecordId,
    /// Values aligned with the schema's field order
    pub values: Vec<Value>,
}

/// One collection: schema and records in store order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    /// Declared schema
    pub schema: CollectionSchema,
    /// Records in insertion order
    pub records: Vec<SnapshotRecord>,
}

impl CollectionSnapshot {
    /// Capture a collection
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a record that has no id or omits a
    /// vector value.
    pub fn capture<'r, I>(schema: &CollectionSchema, records: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let records = records
            .into_iter()
            .map(|record| {
                let id = record.id().ok_or_else(|| {
                    StoreError::invalid_argument(format!(
                        "Cannot snapshot a record of {} without an id",
                        schema.name()
                    ))
                })?;
                let values = record
                    .values()
                    .iter()
                    .cloned()
                    .collect::<Option<Vec<Value>>>()
                    .ok_or_else(|| {
                        StoreError::invalid_argument(format!(
                            "Cannot snapshot projected record {} of {}",
                            id,
                            schema.name()
                        ))
                    })?;
                Ok(SnapshotRecord { id, values })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(CollectionSnapshot {
            schema: schema.clone(),
            records,
        })
    }

    /// Validate and rebuild the schema and its records
    ///
    /// Checks the schema invariants, every record against the schema, and
    /// that ids are non-zero and unique within the collection.
    pub fn restore(self) -> StoreResult<(Arc<CollectionSchema>, Vec<Record>)> {
        self.schema.validate()?;
        let schema = Arc::new(self.schema);
        let mut seen = HashSet::with_capacity(self.records.len());
        let mut records = Vec::with_capacity(self.records.len());
        for stored in self.records {
            if stored.id.as_u64() == 0 {
                return Err(StoreError::Corruption(format!(
                    "Record id 0 in collection {}",
                    schema.name()
                )));
            }
            if !seen.insert(stored.id) {
                return Err(StoreError::Corruption(format!(
                    "Duplicate record id {} in collection {}",
                    stored.id,
                    schema.name()
                )));
            }
            let values = stored.values.into_iter().map(Some).collect();
            records.push(Record::from_parts(
                Arc::clone(&schema),
                Some(stored.id),
                values,
            )?);
        }
        Ok((schema, records))
    }
}

/// Whole-store snapshot payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBody {
    /// Collections keyed by name
    pub collections: BTreeMap<String, CollectionSnapshot>,
}

impl SnapshotBody {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collection, keyed by its schema name
    pub fn insert(&mut self, collection: CollectionSnapshot) {
        self.collections
            .insert(collection.schema.name().to_string(), collection);
    }

    /// Number of collections
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Check if the snapshot holds no collections
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Total number of records across collections
    pub fn record_count(&self) -> usize {
        self.collections.values().map(|c| c.records.len()).sum()
    }

    /// Validate every collection and rebuild its records
    ///
    /// Nothing is returned unless the whole snapshot is valid.
    pub fn restore(self) -> StoreResult<Vec<(Arc<CollectionSchema>, Vec<Record>)>> {
        let mut restored = Vec::with_capacity(self.collections.len());
        for (name, collection) in self.collections {
            if collection.schema.name() != name {
                return Err(StoreError::Corruption(format!(
                    "Collection key {} holds schema {}",
                    name,
                    collection.schema.name()
                )));
            }
            restored.push(collection.restore()?);
        }
        Ok(restored)
    }
}
