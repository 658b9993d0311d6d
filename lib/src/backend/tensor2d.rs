use super::tensor1d::Tensor1D;
use crate::backend::Backend;
use std::marker::PhantomData;
use std::ops::Range;

/// Backend-typed 2D tensor: one row per observation, one column per feature.
///
/// # Example
/// ```
/// use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
///
/// let x = Tensor2D::<CpuBackend>::from_rows(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
/// assert_eq!(x.shape(), (2, 2));
///
/// let w = Tensor1D::<CpuBackend>::new(vec![2.0, 3.0]);
/// assert_eq!(x.dot(&w).to_vec(), vec![2.0, 3.0]);
/// ```
#[derive(Clone)]
pub struct Tensor2D<B: Backend> {
    pub(crate) data: B::Tensor2D,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Tensor2D<B> {
    pub(crate) fn from_raw(data: B::Tensor2D) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Creates a tensor from row-major host values.
    ///
    /// # Panics
    /// Panics if `data.len() != rows * cols`.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Self {
        Self::from_raw(B::from_vec_2d(data, rows, cols))
    }

    /// Creates a tensor from a slice of equal-length rows.
    ///
    /// An empty slice yields a `0 × 0` tensor.
    ///
    /// # Panics
    /// Panics if rows have different lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        assert!(
            rows.iter().all(|r| r.len() == cols),
            "All rows must have same length"
        );
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Self::new(data, n, cols)
    }

    /// Creates a tensor whose columns are the given vectors.
    pub fn from_columns(columns: &[Tensor1D<B>]) -> Self {
        let raw: Vec<B::Tensor1D> = columns.iter().map(|c| c.data.clone()).collect();
        Self::from_raw(B::stack_columns_1d(&raw))
    }

    /// Creates a tensor filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::from_raw(B::zeros_2d(rows, cols))
    }

    /// Matrix-vector product `X @ v`, one entry per row.
    ///
    /// # Panics
    /// Panics if `v.len() != self.cols()`.
    pub fn dot(&self, other: &Tensor1D<B>) -> Tensor1D<B> {
        Tensor1D::from_raw(B::matvec(&self.data, &other.data))
    }

    /// Transposed product `X^T @ v`, one entry per column.
    ///
    /// # Panics
    /// Panics if `v.len() != self.rows()`.
    pub fn tdot(&self, other: &Tensor1D<B>) -> Tensor1D<B> {
        Tensor1D::from_raw(B::matvec_transposed(&self.data, &other.data))
    }

    /// Copies the rows in `range` into a new tensor.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        Self::from_raw(B::slice_rows_2d(&self.data, range))
    }

    /// Returns row `index` (one observation).
    pub fn row(&self, index: usize) -> Tensor1D<B> {
        Tensor1D::from_raw(B::row_2d(&self.data, index))
    }

    /// Returns `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        B::shape(&self.data)
    }

    /// Number of observations.
    pub fn rows(&self) -> usize {
        self.shape().0
    }

    /// Number of features.
    pub fn cols(&self) -> usize {
        self.shape().1
    }

    /// Row-major host values.
    pub fn to_vec(&self) -> Vec<f64> {
        B::to_vec_2d(&self.data)
    }
}

impl<B: Backend> std::fmt::Debug for Tensor2D<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor2D")
            .field("shape", &self.shape())
            .field("data", &self.to_vec())
            .finish()
    }
}
