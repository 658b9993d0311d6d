//! # Backend Abstraction
//!
//! This module provides a trait-based abstraction over numeric containers,
//! so the objective function and the model run unchanged on different storage
//! representations (plain vectors, `ndarray`, future GPU-resident buffers).
//!
//! ## Design Philosophy
//!
//! - **Minimal trait surface**: only the operations the objective and the
//!   classifier need (indexed access, row slicing, element-wise transforms,
//!   matrix-vector products, summation).
//! - **Compile-time dispatch**: backend selection happens through type
//!   parameters, never through trait objects.
//! - **Type-safe tensor handling**: [`Tensor1D`] and [`Tensor2D`] carry their
//!   backend in a `PhantomData`, so containers of different backends cannot be
//!   mixed.
//! - **Feature-gated implementations**: backends are enabled via Cargo features
//!   (`cpu`, `ndarray`).
//!
//! ## Layout convention
//!
//! A design matrix has **one row per observation and one column per feature**.
//!
//! ## Available Backends
//!
//! | Backend          | Feature   | Use Case                          |
//! |------------------|-----------|-----------------------------------|
//! | `CpuBackend`     | `cpu`     | Default, pure-Rust implementation |
//! | `NdarrayBackend` | `ndarray` | Interop with the `ndarray` crate  |
//!
//! ## Example
//!
//! ```rust
//! use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
//!
//! let x: Tensor2D<CpuBackend> = Tensor2D::new(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
//! let w: Tensor1D<CpuBackend> = Tensor1D::new(vec![0.5, 0.5]);
//!
//! let y = x.dot(&w);
//! assert_eq!(y.to_vec(), vec![1.5, 3.5]);
//! ```

use std::ops::Range;

#[cfg(feature = "cpu")]
mod cpu;
#[cfg(feature = "cpu")]
/// Pure-Rust CPU backend implementation with zero external dependencies.
pub use cpu::{CpuBackend, CpuTensor2D};

#[cfg(feature = "ndarray")]
mod ndarray_backend;
#[cfg(feature = "ndarray")]
/// Backend backed by the `ndarray` crate for ecosystem interoperability.
pub use ndarray_backend::{NdarrayBackend, NdarrayTensor2D};

/// Scalar value representation and arithmetic operations.
pub mod scalar;
/// One-dimensional tensor abstraction.
pub mod tensor1d;
/// Two-dimensional tensor abstraction.
pub mod tensor2d;

pub use scalar::{Scalar, ScalarOps};
pub use tensor1d::Tensor1D;
pub use tensor2d::Tensor2D;

/// Abstraction over numeric containers and the kernels run on them.
///
/// Implementations provide concrete 1D/2D storage and the operations used by
/// [`LogisticRegressionFunction`](crate::function::LogisticRegressionFunction)
/// and [`LogisticRegression`](crate::model::LogisticRegression).
///
/// # Safety Guarantees
///
/// - Shape-checked operations (`matvec`, `matvec_transposed`, element-wise
///   binary ops) panic on mismatch
/// - Container types are `Clone + Send + Sync` so objectives built on them
///   can be shared across optimizer worker threads
///
/// # Example Implementation Sketch
///
/// ```ignore
/// use logitfit::backend::Backend;
///
/// #[derive(Clone, Debug, Copy)]
/// struct MyBackend;
///
/// impl Backend for MyBackend {
///     type Scalar = f64;
///     type Tensor1D = MyVector;
///     type Tensor2D = MyMatrix;
///     // ... implement all required methods
/// }
/// ```
pub trait Backend: Clone + Copy + Send + Sync + 'static {
    /// Scalar type supporting arithmetic operations.
    type Scalar: ScalarOps;

    /// One-dimensional tensor type.
    type Tensor1D: Clone + Send + Sync;

    /// Two-dimensional tensor type (rows = observations).
    type Tensor2D: Clone + Send + Sync;

    // --- Constructors ---

    /// Creates a 1D tensor filled with zeros of given length.
    fn zeros_1d(len: usize) -> Self::Tensor1D;

    /// Creates a 2D tensor filled with zeros of given dimensions.
    fn zeros_2d(rows: usize, cols: usize) -> Self::Tensor2D;

    /// Constructs a 1D tensor from owned data.
    fn from_vec_1d(data: Vec<f64>) -> Self::Tensor1D;

    /// Constructs a 2D tensor from row-major ordered data.
    ///
    /// # Panics
    /// If `data.len() != rows * cols`.
    fn from_vec_2d(data: Vec<f64>, rows: usize, cols: usize) -> Self::Tensor2D;

    // --- Element-wise operations (1D) ---

    /// Element-wise addition of two 1D tensors.
    ///
    /// # Panics
    /// If tensors have different lengths.
    fn add_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise subtraction of two 1D tensors.
    ///
    /// # Panics
    /// If tensors have different lengths.
    fn sub_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Element-wise multiplication of two 1D tensors.
    ///
    /// # Panics
    /// If tensors have different lengths.
    fn mul_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Multiplies each element of tensor by a scalar.
    fn mul_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Adds a scalar to each element of tensor.
    fn add_scalar_1d(t: &Self::Tensor1D, s: &Self::Scalar) -> Self::Tensor1D;

    /// Applies `f` to every element.
    fn map_1d<F>(t: &Self::Tensor1D, f: F) -> Self::Tensor1D
    where
        F: Fn(Self::Scalar) -> Self::Scalar;

    /// Element-wise sigmoid `1 / (1 + e^(-x))`, numerically stable for large |x|.
    fn sigmoid_1d(x: &Self::Tensor1D) -> Self::Tensor1D;

    // --- Reductions ---

    /// Computes the sum of all elements in a 1D tensor.
    fn sum_all_1d(t: &Self::Tensor1D) -> Self::Scalar;

    // --- Scalar operations ---

    /// Creates a backend-specific scalar from an f64 value.
    fn scalar_f64(value: f64) -> Self::Scalar;

    // --- Data access ---

    /// Converts a 1D tensor to a Vec of f64 values.
    fn to_vec_1d(t: &Self::Tensor1D) -> Vec<f64>;

    /// Converts a 2D tensor to row-major f64 values.
    fn to_vec_2d(t: &Self::Tensor2D) -> Vec<f64>;

    /// Returns the number of elements in a 1D tensor.
    fn len_1d(t: &Self::Tensor1D) -> usize;

    /// Returns element `index` of a 1D tensor.
    ///
    /// # Panics
    /// If `index` is out of bounds.
    fn get_1d(t: &Self::Tensor1D, index: usize) -> Self::Scalar;

    /// Returns the shape of a 2D tensor as (rows, cols).
    fn shape(t: &Self::Tensor2D) -> (usize, usize);

    // --- Slicing and assembly ---

    /// Copies the elements in `range` into a new 1D tensor.
    ///
    /// # Panics
    /// If `range` exceeds the tensor length.
    fn slice_1d(t: &Self::Tensor1D, range: Range<usize>) -> Self::Tensor1D;

    /// Concatenates two 1D tensors: `[a..., b...]`.
    fn concat_1d(a: &Self::Tensor1D, b: &Self::Tensor1D) -> Self::Tensor1D;

    /// Copies the rows in `range` into a new 2D tensor.
    ///
    /// # Panics
    /// If `range` exceeds the row count.
    fn slice_rows_2d(t: &Self::Tensor2D, range: Range<usize>) -> Self::Tensor2D;

    /// Returns row `index` as a 1D tensor.
    fn row_2d(t: &Self::Tensor2D, index: usize) -> Self::Tensor1D;

    /// Builds a 2D tensor whose columns are the given equal-length 1D tensors.
    ///
    /// # Panics
    /// If the columns have different lengths.
    fn stack_columns_1d(columns: &[Self::Tensor1D]) -> Self::Tensor2D;

    // --- Linear algebra ---

    /// Matrix-vector multiplication: `y = A * x`, `A` is (m × n), `x` is (n,).
    ///
    /// # Panics
    /// If `A.cols() != x.len()`.
    fn matvec(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D;

    /// Transposed matrix-vector multiplication: `y = A^T * x`, `x` is (m,).
    ///
    /// # Panics
    /// If `A.rows() != x.len()`.
    fn matvec_transposed(a: &Self::Tensor2D, x: &Self::Tensor1D) -> Self::Tensor1D;
}

/// Numerically stable scalar sigmoid shared by the backend implementations.
pub(crate) fn stable_sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let ez = z.exp();
        ez / (1.0 + ez)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_sigmoid_symmetry() {
        for z in [-30.0, -2.0, -0.5, 0.0, 0.5, 2.0, 30.0] {
            let s = stable_sigmoid(z) + stable_sigmoid(-z);
            assert!((s - 1.0).abs() < 1e-12, "sigmoid({z}) not symmetric");
        }
        assert_eq!(stable_sigmoid(0.0), 0.5);
    }

    #[test]
    fn test_stable_sigmoid_extremes_are_finite() {
        assert_eq!(stable_sigmoid(1000.0), 1.0);
        assert_eq!(stable_sigmoid(-1000.0), 0.0);
        assert!(!stable_sigmoid(-750.0).is_nan());
    }
}
