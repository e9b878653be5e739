//! Filter algebra
//!
//! - [`Filter`]: a single field predicate `(collection, field, op, value)`
//! - [`FilterSet`]: AND-combination of filters scoped to one collection
//! - [`FieldRef`]: named builder methods (`eq`, `gte`, `lte`, `gt`, `lt`,
//!   `between`) that turn a schema field into filters
//!
//! Filters are validated against the schema when built, so evaluation only
//! fails when a filter is applied to a record of a different collection.

use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::schema::{CollectionSchema, FieldDef};
use crate::similarity::Similarity;
use crate::value::Value;

/// Separator between field name and operator in lookup keys (`age__gte`)
pub const LOOKUP_SEPARATOR: &str = "__";

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// Value equality
    Eq,
    /// Greater than or equal
    Gte,
    /// Less than or equal
    Lte,
    /// Strictly greater
    Gt,
    /// Strictly less
    Lt,
}

impl FilterOp {
    /// All supported operators
    pub const ALL: [FilterOp; 5] = [
        FilterOp::Eq,
        FilterOp::Gte,
        FilterOp::Lte,
        FilterOp::Gt,
        FilterOp::Lt,
    ];

    /// Operator name
    pub fn name(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Gte => "gte",
            FilterOp::Lte => "lte",
            FilterOp::Gt => "gt",
            FilterOp::Lt => "lt",
        }
    }

    /// Parse an operator name
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for unknown names.
    pub fn parse(s: &str) -> StoreResult<Self> {
        FilterOp::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| {
                StoreError::unsupported(format!(
                    "Operation {} not supported. Supported operations are eq, gte, lte, gt, lt",
                    s
                ))
            })
    }

    /// Whether the operator needs an ordering
    pub fn is_ordering(&self) -> bool {
        !matches!(self, FilterOp::Eq)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single field predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    collection: String,
    field: String,
    op: FilterOp,
    value: Value,
}

impl Filter {
    /// Build a filter, validating it against the schema
    ///
    /// # Errors
    ///
    /// - `Schema` if the field is unknown or the value cannot be compared
    ///   with the field type
    /// - `UnsupportedOperation` for an ordering operator on a vector field
    pub fn new(
        schema: &CollectionSchema,
        field: &str,
        op: FilterOp,
        value: impl Into<Value>,
    ) -> StoreResult<Self> {
        let (_, def) = schema.require_field(field)?;
        let value = value.into();
        if !def.field_type.is_comparable_with(&value) {
            return Err(StoreError::schema(format!(
                "Cannot compare field {} ({}) with {}",
                def.name,
                def.field_type.name(),
                value.type_name()
            )));
        }
        if op.is_ordering() && def.field_type.is_vector() {
            return Err(StoreError::unsupported(format!(
                "{} on vector field {}",
                op, def.name
            )));
        }
        Ok(Filter {
            collection: schema.name().to_string(),
            field: def.name.clone(),
            op,
            value,
        })
    }

    /// Collection the filter is scoped to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Operator
    pub fn op(&self) -> FilterOp {
        self.op
    }

    /// Comparison value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluate the predicate against a record
    ///
    /// Absent values (projected vectors) never match.
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the record belongs to another collection or
    /// lacks the field.
    pub fn evaluate(&self, record: &Record) -> StoreResult<bool> {
        if record.collection() != self.collection {
            return Err(StoreError::schema(format!(
                "Filter on {} applied to a {} record",
                self.collection,
                record.collection()
            )));
        }
        let index = record.schema().field_index(&self.field).ok_or_else(|| {
            StoreError::schema(format!("Field {} not in {}", self.field, self.collection))
        })?;
        let Some(actual) = record.values()[index].as_ref() else {
            return Ok(false);
        };
        Ok(match self.op {
            FilterOp::Eq => actual.loose_eq(&self.value),
            op => actual
                .compare(&self.value)
                .is_some_and(|ordering| match op {
                    FilterOp::Gte => ordering.is_ge(),
                    FilterOp::Lte => ordering.is_le(),
                    FilterOp::Gt => ordering.is_gt(),
                    FilterOp::Lt => ordering.is_lt(),
                    FilterOp::Eq => ordering.is_eq(),
                }),
        })
    }

    /// AND this filter with another
    pub fn and(self, other: impl Into<FilterSet>) -> StoreResult<FilterSet> {
        FilterSet::from(self).and(other)
    }
}

/// Conjunction of filters over one collection
///
/// An empty set matches every record of the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    collection: String,
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Empty set (matches all) scoped to a collection
    pub fn new(collection: impl Into<String>) -> Self {
        FilterSet {
            collection: collection.into(),
            filters: Vec::new(),
        }
    }

    /// Collection the set is scoped to
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Filters in insertion order
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if the set is empty (matches all)
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Concatenate two sets of the same collection
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the collections differ.
    pub fn combine(a: FilterSet, b: FilterSet) -> StoreResult<FilterSet> {
        if a.collection != b.collection {
            return Err(StoreError::schema(format!(
                "Cannot combine filters on {} with filters on {}",
                a.collection, b.collection
            )));
        }
        let mut filters = a.filters;
        filters.extend(b.filters);
        Ok(FilterSet {
            collection: a.collection,
            filters,
        })
    }

    /// AND another filter or set into this one
    pub fn and(self, other: impl Into<FilterSet>) -> StoreResult<FilterSet> {
        FilterSet::combine(self, other.into())
    }

    /// Check if a record satisfies every filter
    pub fn matches(&self, record: &Record) -> StoreResult<bool> {
        for filter in &self.filters {
            if !filter.evaluate(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Keep the records satisfying every filter, preserving order
    pub fn apply<'r, I>(&self, records: I) -> StoreResult<Vec<&'r Record>>
    where
        I: IntoIterator<Item = &'r Record>,
    {
        let mut matched = Vec::new();
        for record in records {
            if self.matches(record)? {
                matched.push(record);
            }
        }
        Ok(matched)
    }
}

impl From<Filter> for FilterSet {
    fn from(filter: Filter) -> Self {
        FilterSet {
            collection: filter.collection.clone(),
            filters: vec![filter],
        }
    }
}

/// Handle on a schema field used to build filters and similarity criteria
#[derive(Debug, Clone, Copy)]
pub struct FieldRef<'a> {
    schema: &'a CollectionSchema,
    def: &'a FieldDef,
}

impl<'a> FieldRef<'a> {
    /// Field definition
    pub fn def(&self) -> &'a FieldDef {
        self.def
    }

    fn filter(&self, op: FilterOp, value: impl Into<Value>) -> StoreResult<Filter> {
        Filter::new(self.schema, &self.def.name, op, value)
    }

    /// `field == value`
    pub fn eq(&self, value: impl Into<Value>) -> StoreResult<Filter> {
        self.filter(FilterOp::Eq, value)
    }

    /// `field >= value`
    pub fn gte(&self, value: impl Into<Value>) -> StoreResult<Filter> {
        self.filter(FilterOp::Gte, value)
    }

    /// `field <= value`
    pub fn lte(&self, value: impl Into<Value>) -> StoreResult<Filter> {
        self.filter(FilterOp::Lte, value)
    }

    /// `field > value`
    pub fn gt(&self, value: impl Into<Value>) -> StoreResult<Filter> {
        self.filter(FilterOp::Gt, value)
    }

    /// `field < value`
    pub fn lt(&self, value: impl Into<Value>) -> StoreResult<Filter> {
        self.filter(FilterOp::Lt, value)
    }

    /// `low <= field <= high`
    pub fn between(
        &self,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> StoreResult<FilterSet> {
        self.gte(low)?.and(self.lte(high)?)
    }

    /// Nearest-neighbor criterion on this vector field
    pub fn similar_to(&self, vector: impl Into<Vec<f32>>) -> StoreResult<Similarity> {
        Similarity::new(self.schema, &self.def.name, vector)
    }
}

impl CollectionSchema {
    /// Handle on a field for building filters
    ///
    /// # Errors
    ///
    /// Returns `Schema` if the field is not declared.
    pub fn field(&self, name: &str) -> StoreResult<FieldRef<'_>> {
        let (_, def) = self.require_field(name)?;
        Ok(FieldRef { schema: self, def })
    }

    /// Build a filter from a lookup key such as `age__gte`
    ///
    /// A key without an operator suffix means `eq`.
    pub fn filter_from_lookup(&self, key: &str, value: impl Into<Value>) -> StoreResult<Filter> {
        let (field, op) = match key.split_once(LOOKUP_SEPARATOR) {
            Some((field, op)) => (field, FilterOp::parse(op)?),
            None => (key, FilterOp::Eq),
        };
        Filter::new(self, field, op, value)
    }

    /// Build a filter set from several lookups
    pub fn lookup_filters<K, V, I>(&self, lookups: I) -> StoreResult<FilterSet>
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut set = FilterSet::new(self.name());
        for (key, value) in lookups {
            set = set.and(self.filter_from_lookup(key.as_ref(), value)?)?;
        }
        Ok(set)
    }
}
