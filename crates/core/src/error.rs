//! Error types for Affine
//!
//! Every fallible operation in the workspace reports a [`StoreError`].
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The taxonomy is small on purpose: the store is local and synchronous, so
//! nothing is retried and every error is surfaced directly to the caller.

use std::io;
use thiserror::Error;

use crate::types::RecordId;

/// Result type alias for Affine operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Error types for the record store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Schema violation: unknown field, wrong value type, vector length
    /// mismatch, or a filter combined across collections
    #[error("Schema error: {message}")]
    Schema {
        /// Human-readable description
        message: String,
    },

    /// Operation not supported (unknown filter operator, metric a backend
    /// cannot index, ordering on a vector field)
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// The rejected operation
        operation: String,
    },

    /// No record with the given id in the collection
    #[error("Record {id} not found in collection '{collection}'")]
    NotFound {
        /// Collection name
        collection: String,
        /// Requested id
        id: RecordId,
    },

    /// More than one record matched a single-id lookup
    #[error("Multiple records ({count}) found with id {id} in collection '{collection}'")]
    MultipleFound {
        /// Collection name
        collection: String,
        /// Requested id
        id: RecordId,
        /// Number of matches
        count: usize,
    },

    /// Malformed call (delete target without id, several similarity criteria)
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Human-readable description
        message: String,
    },

    /// An optional nearest-neighbor backend was compiled out
    #[error("Backend '{backend}' is unavailable: enable the '{feature}' feature")]
    MissingDependency {
        /// Backend name
        backend: String,
        /// Cargo feature that provides it
        feature: String,
    },

    /// I/O error (snapshot files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Snapshot framing is damaged (magic, version, length or checksum)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Engine configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

impl StoreError {
    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        StoreError::Schema {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(operation: impl Into<String>) -> Self {
        StoreError::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a missing-dependency error
    pub fn missing_dependency(backend: impl Into<String>, feature: impl Into<String>) -> Self {
        StoreError::MissingDependency {
            backend: backend.into(),
            feature: feature.into(),
        }
    }

    /// Check if this error indicates the record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Check if this error is a validation error (raised before any mutation)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            StoreError::Schema { .. }
                | StoreError::UnsupportedOperation { .. }
                | StoreError::InvalidArgument { .. }
        )
    }
}
