//! Fluent query builder
//!
//! A [`QueryBuilder`] accumulates filters and a similarity criterion for one
//! collection, then hands them to its engine on a terminal call:
//!
//! ```text
//! engine.collection(&person)?
//!     .filter(person.field("age")?.gte(25)?)
//!     .similarity(person.field("embedding")?.similar_to(vec![1.8f32, 2.3])?)
//!     .limit(1)?
//! ```
//!
//! Accumulating never touches the store. Errors raised while accumulating
//! (a filter from another collection) are held and reported by the terminal
//! call.

use std::sync::Arc;

use affine_core::{CollectionSchema, Filter, FilterSet, Record, RecordId, Similarity, StoreError, StoreResult};

use crate::contract::StorageEngine;

/// Anything `.filter` accepts
#[derive(Debug, Clone)]
pub enum Criterion {
    /// A single predicate
    Filter(Filter),
    /// A conjunction of predicates
    FilterSet(FilterSet),
    /// A nearest-neighbor criterion
    Similarity(Similarity),
}

impl From<Filter> for Criterion {
    fn from(filter: Filter) -> Self {
        Criterion::Filter(filter)
    }
}

impl From<FilterSet> for Criterion {
    fn from(set: FilterSet) -> Self {
        Criterion::FilterSet(set)
    }
}

impl From<Similarity> for Criterion {
    fn from(similarity: Similarity) -> Self {
        Criterion::Similarity(similarity)
    }
}

/// Query accumulator bound to one engine and one collection
pub struct QueryBuilder<'e, E: StorageEngine + ?Sized> {
    engine: &'e E,
    schema: Arc<CollectionSchema>,
    filters: FilterSet,
    similarity: Option<Similarity>,
    extra_similarities: Vec<Similarity>,
    with_vectors: bool,
    error: Option<StoreError>,
}

impl<'e, E: StorageEngine + ?Sized> QueryBuilder<'e, E> {
    /// Start an empty query over `schema`'s collection
    pub fn new(engine: &'e E, schema: &Arc<CollectionSchema>) -> Self {
        QueryBuilder {
            engine,
            filters: FilterSet::new(schema.name()),
            schema: Arc::clone(schema),
            similarity: None,
            extra_similarities: Vec::new(),
            with_vectors: true,
            error: None,
        }
    }

    /// Collection schema
    pub fn schema(&self) -> &Arc<CollectionSchema> {
        &self.schema
    }

    /// Accumulated filters
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// AND a criterion into the query
    ///
    /// Similarity criteria passed here are kept in addition to the one set
    /// by [`similarity`](Self::similarity); executing with more than one
    /// fails.
    pub fn filter(mut self, criterion: impl Into<Criterion>) -> Self {
        if self.error.is_some() {
            return self;
        }
        match criterion.into() {
            Criterion::Filter(filter) => self.and(FilterSet::from(filter)),
            Criterion::FilterSet(set) => self.and(set),
            Criterion::Similarity(similarity) => {
                self.extra_similarities.push(similarity);
                self
            }
        }
    }

    /// Set the similarity criterion (last write wins)
    pub fn similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = Some(similarity);
        self
    }

    /// Ask for records without vector values (advisory)
    pub fn with_vectors(mut self, with_vectors: bool) -> Self {
        self.with_vectors = with_vectors;
        self
    }

    /// Run with no limit
    pub fn all(self) -> StoreResult<Vec<Record>> {
        self.execute(None)
    }

    /// Run with at most `n` results
    pub fn limit(self, n: usize) -> StoreResult<Vec<Record>> {
        self.execute(Some(n))
    }

    /// Look up one record of this collection by id
    ///
    /// Accumulated criteria are ignored.
    pub fn get_by_id(self, id: RecordId) -> StoreResult<Record> {
        self.engine.get_element_by_id(self.schema.name(), id)
    }

    fn and(mut self, other: FilterSet) -> Self {
        let current = std::mem::replace(&mut self.filters, FilterSet::new(self.schema.name()));
        match current.and(other) {
            Ok(combined) => self.filters = combined,
            Err(e) => self.error = Some(e),
        }
        self
    }

    fn execute(mut self, limit: Option<usize>) -> StoreResult<Vec<Record>> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let mut similarities: Vec<Similarity> = self.similarity.take().into_iter().collect();
        similarities.append(&mut self.extra_similarities);
        if similarities.len() > 1 {
            return Err(StoreError::invalid_argument(format!(
                "Only one similarity criterion is allowed per query, got {}",
                similarities.len()
            )));
        }

        self.engine.query(
            self.schema.name(),
            &self.filters,
            similarities.first(),
            limit,
            self.with_vectors,
        )
    }
}
