//! In-process storage engine
//!
//! [`LocalEngine`] keeps every collection as an ordered `Vec<Record>` plus
//! an id counter. Queries scan the collection, apply the filter set, and for
//! similarity queries build a one-shot index over the surviving candidates.
//!
//! ## Id assignment
//!
//! Each collection tracks the highest id it has ever assigned. Inserts take
//! `counter + 1`; deletes never lower the counter, so ids are not reused.
//! Loading a snapshot resets every counter to the highest id present.
//!
//! ## Persistence
//!
//! `save`/`load` write and read the whole store through the snapshot codec.
//! `load` validates the complete snapshot before replacing any state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use affine_core::{
    CollectionSchema, FieldType, FilterSet, Record, RecordId, Similarity, StoreError, StoreResult,
};
use affine_durability::{
    decode_snapshot, encode_snapshot, read_snapshot, write_snapshot_atomic, CollectionSnapshot,
    SnapshotBody, SnapshotInfo,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::contract::{DeleteTarget, StorageEngine};
use crate::vector::{IndexBackendFactory, VectorIndexBackend, VectorMatrix};

/// One registered collection
struct CollectionState {
    schema: Arc<CollectionSchema>,
    records: Vec<Record>,
    /// Highest id ever assigned
    last_id: u64,
}

impl CollectionState {
    fn new(schema: Arc<CollectionSchema>) -> Self {
        CollectionState {
            schema,
            records: Vec::new(),
            last_id: 0,
        }
    }
}

/// In-memory record store with pluggable nearest-neighbor search
pub struct LocalEngine {
    collections: BTreeMap<String, CollectionState>,
    factory: IndexBackendFactory,
    backend: Box<dyn VectorIndexBackend>,
}

impl LocalEngine {
    /// Create an empty engine using brute-force search
    pub fn new() -> Self {
        LocalEngine {
            collections: BTreeMap::new(),
            factory: IndexBackendFactory::BruteForce,
            backend: Box::new(crate::vector::BruteForceBackend),
        }
    }

    /// Create an empty engine using the given backend
    ///
    /// # Errors
    ///
    /// Returns `MissingDependency` if the backend was compiled out.
    pub fn with_backend(factory: IndexBackendFactory) -> StoreResult<Self> {
        let backend = factory.create()?;
        Ok(LocalEngine {
            collections: BTreeMap::new(),
            factory,
            backend,
        })
    }

    /// Create an empty engine from `affine.toml` settings
    ///
    /// # Errors
    ///
    /// Returns `Config` for an unknown backend name, `MissingDependency` if
    /// the backend was compiled out.
    pub fn from_config(config: &EngineConfig) -> StoreResult<Self> {
        Self::with_backend(config.index_factory()?)
    }

    /// Backend selection
    pub fn backend(&self) -> &IndexBackendFactory {
        &self.factory
    }

    /// Registered collection names, sorted
    pub fn collections(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Schema registered under `name`
    pub fn schema(&self, name: &str) -> Option<&Arc<CollectionSchema>> {
        self.collections.get(name).map(|c| &c.schema)
    }

    /// Number of records in a collection (0 if unknown)
    pub fn count(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.records.len())
    }

    /// Highest id ever assigned in a collection (0 if none)
    pub fn last_id(&self, collection: &str) -> u64 {
        self.collections.get(collection).map_or(0, |c| c.last_id)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Capture the whole store
    pub fn snapshot(&self) -> StoreResult<SnapshotBody> {
        let mut body = SnapshotBody::new();
        for state in self.collections.values() {
            body.insert(CollectionSnapshot::capture(&state.schema, &state.records)?);
        }
        Ok(body)
    }

    /// Replace the whole store with a snapshot
    ///
    /// Every collection is validated before any state changes. Id counters
    /// restart from the highest id present in each collection.
    pub fn restore(&mut self, body: SnapshotBody) -> StoreResult<()> {
        let mut collections = BTreeMap::new();
        for (schema, records) in body.restore()? {
            let last_id = records
                .iter()
                .filter_map(Record::id)
                .map(|id| id.as_u64())
                .max()
                .unwrap_or(0);
            collections.insert(
                schema.name().to_string(),
                CollectionState {
                    schema,
                    records,
                    last_id,
                },
            );
        }
        self.collections = collections;
        Ok(())
    }

    /// Serialize the whole store to `writer`
    ///
    /// Returns the number of bytes written.
    pub fn save<W: Write>(&self, writer: &mut W) -> StoreResult<u64> {
        let start = Instant::now();
        let body = self.snapshot()?;
        let bytes = encode_snapshot(&body, writer)?;
        info!(
            target: "affine::engine",
            collections = body.len(),
            records = body.record_count(),
            bytes,
            duration_us = start.elapsed().as_micros() as u64,
            "Store saved"
        );
        Ok(bytes)
    }

    /// Replace the whole store with one read from `reader`
    pub fn load<R: Read>(&mut self, reader: &mut R) -> StoreResult<()> {
        let start = Instant::now();
        let body = decode_snapshot(reader)?;
        let collections = body.len();
        let records = body.record_count();
        self.restore(body)?;
        info!(
            target: "affine::engine",
            collections,
            records,
            duration_us = start.elapsed().as_micros() as u64,
            "Store loaded"
        );
        Ok(())
    }

    /// Save to a file atomically (temp file, fsync, rename)
    pub fn save_to_path(&self, path: &Path) -> StoreResult<SnapshotInfo> {
        let body = self.snapshot()?;
        Ok(write_snapshot_atomic(&body, path)?)
    }

    /// Replace the whole store with the snapshot file at `path`
    pub fn load_from_path(&mut self, path: &Path) -> StoreResult<()> {
        let body = read_snapshot(path)?;
        let records = body.record_count();
        self.restore(body)?;
        info!(
            target: "affine::engine",
            path = %path.display(),
            records,
            "Store loaded from file"
        );
        Ok(())
    }

    // ========================================================================
    // Query evaluation
    // ========================================================================

    /// Rank candidates by distance to the similarity query
    fn rank(
        &self,
        schema: &CollectionSchema,
        candidates: &[&Record],
        similarity: &Similarity,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Record>> {
        let metric = similarity.effective_metric(schema)?;
        let (_, def) = schema.require_field(similarity.field())?;
        let FieldType::Vector { dimension, .. } = def.field_type else {
            return Err(StoreError::schema(format!(
                "Field {} in {} is not a vector field",
                def.name,
                schema.name()
            )));
        };

        let mut matrix = VectorMatrix::with_capacity(dimension, candidates.len());
        for record in candidates {
            let vector = record.vector(similarity.field()).ok_or_else(|| {
                StoreError::schema(format!(
                    "Record {:?} of {} has no value for {}",
                    record.id(),
                    schema.name(),
                    similarity.field()
                ))
            })?;
            matrix.push(vector)?;
        }

        let index = self.backend.build(matrix, metric)?;
        let k = limit.unwrap_or(candidates.len());
        let neighbors = index.search(similarity.vector(), k)?;

        debug!(
            target: "affine::ann",
            backend = self.backend.name(),
            metric = %metric,
            rows = index.len(),
            k,
            returned = neighbors.len(),
            "Similarity search"
        );

        neighbors
            .into_iter()
            .map(|n| {
                candidates.get(n.index).map(|r| (*r).clone()).ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "{} returned row {} for {} candidates",
                        self.backend.name(),
                        n.index,
                        candidates.len()
                    ))
                })
            })
            .collect()
    }
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEngine")
            .field("backend", &self.backend.name())
            .field("collections", &self.collections.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StorageEngine for LocalEngine {
    fn register_collection(&mut self, schema: &Arc<CollectionSchema>) -> StoreResult<()> {
        if let Some(existing) = self.collections.get(schema.name()) {
            if *existing.schema != **schema {
                return Err(StoreError::schema(format!(
                    "Collection {} is already registered with a different schema",
                    schema.name()
                )));
            }
            return Ok(());
        }

        schema.validate()?;
        self.collections
            .insert(schema.name().to_string(), CollectionState::new(Arc::clone(schema)));
        info!(
            target: "affine::engine",
            collection = schema.name(),
            fields = schema.len(),
            "Collection registered"
        );
        Ok(())
    }

    fn insert(&mut self, record: Record) -> StoreResult<RecordId> {
        if let Some(id) = record.id() {
            return Err(StoreError::invalid_argument(format!(
                "Record {} of {} is already stored",
                id,
                record.collection()
            )));
        }
        record.validate()?;

        let schema = Arc::clone(record.schema());
        self.register_collection(&schema)?;
        let state = self
            .collections
            .get_mut(schema.name())
            .ok_or_else(|| StoreError::schema(format!("Unknown collection {}", schema.name())))?;

        let next = state.last_id.checked_add(1).ok_or_else(|| {
            StoreError::invalid_argument(format!("Id space of {} is exhausted", schema.name()))
        })?;
        let id = RecordId::new(next);
        state.records.push(record.with_id(id)?);
        state.last_id = id.as_u64();

        debug!(target: "affine::engine", collection = schema.name(), id = %id, "Record inserted");
        Ok(id)
    }

    fn delete(&mut self, target: DeleteTarget<'_>) -> StoreResult<()> {
        let (collection, id) = target.resolve()?;
        let not_found = || StoreError::NotFound {
            collection: collection.to_string(),
            id,
        };

        let state = self.collections.get_mut(collection).ok_or_else(not_found)?;
        let position = state
            .records
            .iter()
            .position(|r| r.id() == Some(id))
            .ok_or_else(not_found)?;
        state.records.remove(position);

        debug!(target: "affine::engine", collection, id = %id, "Record deleted");
        Ok(())
    }

    fn get_elements_by_ids(&self, collection: &str, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        let Some(state) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let wanted: BTreeSet<RecordId> = ids.iter().copied().collect();
        Ok(state
            .records
            .iter()
            .filter(|r| r.id().is_some_and(|id| wanted.contains(&id)))
            .cloned()
            .collect())
    }

    fn query(
        &self,
        collection: &str,
        filter_set: &FilterSet,
        similarity: Option<&Similarity>,
        limit: Option<usize>,
        with_vectors: bool,
    ) -> StoreResult<Vec<Record>> {
        let start = Instant::now();

        if filter_set.collection() != collection {
            return Err(StoreError::schema(format!(
                "Filters on {} cannot query {}",
                filter_set.collection(),
                collection
            )));
        }
        if let Some(similarity) = similarity {
            if similarity.collection() != collection {
                return Err(StoreError::schema(format!(
                    "Similarity on {} cannot query {}",
                    similarity.collection(),
                    collection
                )));
            }
        }
        if !with_vectors {
            warn!(
                target: "affine::engine",
                collection,
                "with_vectors=false is not supported by the local engine; returning full records"
            );
        }

        let Some(state) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let candidates = filter_set.apply(&state.records)?;
        let results = match similarity {
            Some(similarity) => self.rank(&state.schema, &candidates, similarity, limit)?,
            None => candidates
                .iter()
                .take(limit.unwrap_or(usize::MAX))
                .map(|r| (*r).clone())
                .collect(),
        };

        debug!(
            target: "affine::engine",
            collection,
            filters = filter_set.len(),
            similarity = similarity.is_some(),
            candidates = candidates.len(),
            returned = results.len(),
            duration_us = start.elapsed().as_micros() as u64,
            "Query complete"
        );
        Ok(results)
    }
}
