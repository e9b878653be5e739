//! Storage-engine contract
//!
//! [`StorageEngine`] is the seam between the query surface and whatever
//! holds the records. [`LocalEngine`](crate::LocalEngine) implements it
//! in-process; adapters for external vector databases implement the same
//! operations against their service.
//!
//! The contract is synchronous. Mutations take `&mut self` and queries take
//! `&self`, so a single engine is never mutated concurrently.

use std::sync::Arc;

use affine_core::{CollectionSchema, FilterSet, Record, RecordId, Similarity, StoreError, StoreResult};

use crate::query::QueryBuilder;

/// Target of a delete: a stored record, or an explicit `(collection, id)` pair
#[derive(Debug, Clone, Copy)]
pub enum DeleteTarget<'a> {
    /// A record previously returned by the engine (must carry an id)
    Record(&'a Record),
    /// Explicit collection and id
    Id {
        /// Collection name
        collection: &'a str,
        /// Record id
        id: RecordId,
    },
}

impl<'a> DeleteTarget<'a> {
    /// Resolve to `(collection, id)`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a record that was never inserted.
    pub fn resolve(&self) -> StoreResult<(&'a str, RecordId)> {
        match *self {
            DeleteTarget::Record(record) => match record.id() {
                Some(id) => Ok((record.collection(), id)),
                None => Err(StoreError::invalid_argument(format!(
                    "Cannot delete a record of {} without an id",
                    record.collection()
                ))),
            },
            DeleteTarget::Id { collection, id } => Ok((collection, id)),
        }
    }
}

impl<'a> From<&'a Record> for DeleteTarget<'a> {
    fn from(record: &'a Record) -> Self {
        DeleteTarget::Record(record)
    }
}

impl<'a> From<(&'a str, RecordId)> for DeleteTarget<'a> {
    fn from((collection, id): (&'a str, RecordId)) -> Self {
        DeleteTarget::Id { collection, id }
    }
}

/// Operations every record store provides
pub trait StorageEngine {
    /// Register a collection (idempotent)
    ///
    /// # Errors
    ///
    /// Returns `Schema` if a different schema is already registered under
    /// the same name.
    fn register_collection(&mut self, schema: &Arc<CollectionSchema>) -> StoreResult<()>;

    /// Insert a record and return its newly assigned id
    ///
    /// Ids are assigned per collection in strictly increasing order starting
    /// at 1 and are never reused.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the record already has an id, or
    /// `Schema` if it does not validate against its collection.
    fn insert(&mut self, record: Record) -> StoreResult<RecordId>;

    /// Remove one record
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record matches, `InvalidArgument` if the
    /// target is malformed.
    fn delete(&mut self, target: DeleteTarget<'_>) -> StoreResult<()>;

    /// Records of `collection` whose id is in `ids`, in store order
    ///
    /// # Errors
    ///
    /// Implementations backed by external services may fail; the local
    /// engine never does.
    fn get_elements_by_ids(&self, collection: &str, ids: &[RecordId]) -> StoreResult<Vec<Record>>;

    /// Evaluate a query
    ///
    /// Filters are applied conjunctively preserving store order. With a
    /// similarity criterion the candidates are ranked nearest-first and
    /// `limit = None` ranks every candidate. Without one, candidates keep
    /// store order truncated to `limit`.
    ///
    /// `with_vectors = false` asks for records without vector values; engines
    /// may ignore it.
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the filter set or similarity belongs to another
    /// collection, `MissingDependency`/`UnsupportedOperation` if the index
    /// backend cannot serve the query.
    fn query(
        &self,
        collection: &str,
        filter_set: &FilterSet,
        similarity: Option<&Similarity>,
        limit: Option<usize>,
        with_vectors: bool,
    ) -> StoreResult<Vec<Record>>;

    /// Look up exactly one record by id
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for zero matches and `MultipleFound` for more
    /// than one.
    fn get_element_by_id(&self, collection: &str, id: RecordId) -> StoreResult<Record> {
        let mut found = self.get_elements_by_ids(collection, &[id])?;
        match found.len() {
            1 => Ok(found.remove(0)),
            0 => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            }),
            count => Err(StoreError::MultipleFound {
                collection: collection.to_string(),
                id,
                count,
            }),
        }
    }

    /// Register `schema` and start a query against it
    fn collection(&mut self, schema: &Arc<CollectionSchema>) -> StoreResult<QueryBuilder<'_, Self>>
    where
        Self: Sized,
    {
        self.register_collection(schema)?;
        Ok(QueryBuilder::new(&*self, schema))
    }
}
