//! Vector Matrix - Contiguous candidate storage
//!
//! A VectorMatrix holds the vectors an index is built over, in a single
//! row-major `Vec<f32>`. Row `i` is the `i`-th candidate; backends report
//! neighbors as row indices into the matrix.

use affine_core::{StoreError, StoreResult};

/// Row-major matrix of equal-length vectors
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatrix {
    dimension: usize,
    /// Layout: [v0_dim0, v0_dim1, ..., v0_dimN, v1_dim0, v1_dim1, ...]
    data: Vec<f32>,
}

impl VectorMatrix {
    /// Create an empty matrix of the given dimension
    pub fn new(dimension: usize) -> Self {
        VectorMatrix {
            dimension,
            data: Vec::new(),
        }
    }

    /// Create an empty matrix with room for `rows` vectors
    pub fn with_capacity(dimension: usize, rows: usize) -> Self {
        VectorMatrix {
            dimension,
            data: Vec::with_capacity(dimension * rows),
        }
    }

    /// Build a matrix from rows
    ///
    /// # Errors
    ///
    /// Returns `Schema` if a row length differs from `dimension`.
    pub fn from_rows<'a, I>(dimension: usize, rows: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let rows = rows.into_iter();
        let mut matrix = VectorMatrix::with_capacity(dimension, rows.size_hint().0);
        for row in rows {
            matrix.push(row)?;
        }
        Ok(matrix)
    }

    /// Append a row
    pub fn push(&mut self, row: &[f32]) -> StoreResult<()> {
        if row.len() != self.dimension {
            return Err(StoreError::schema(format!(
                "Expected vector of length {}, got {}",
                self.dimension,
                row.len()
            )));
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    /// Check if the matrix has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get a row
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// Raw row-major data
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Check that a query vector fits this matrix
    pub(crate) fn check_query(&self, query: &[f32]) -> StoreResult<()> {
        if query.len() != self.dimension {
            return Err(StoreError::schema(format!(
                "Query vector has length {}, index dimension is {}",
                query.len(),
                self.dimension
            )));
        }
        Ok(())
    }
}
