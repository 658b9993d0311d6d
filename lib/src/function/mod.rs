//! # Objective functions
//!
//! Contracts between an objective and the optimizers that minimize it.
//!
//! An objective is a pure function of its stored data: every method takes
//! `&self` and a caller-owned parameter vector, so one objective can be
//! queried from several optimizer workers at once.
//!
//! - [`DifferentiableFunction`]: full-data objective value and gradient.
//! - [`SeparableFunction`]: the same objective decomposed over observations,
//!   for mini-batch optimizers.
//!
//! [`LogisticRegressionFunction`] implements both.

use crate::backend::{Backend, Tensor1D};

mod logistic;

pub use logistic::LogisticRegressionFunction;

/// A scalar objective with a gradient.
///
/// # Example
/// ```
/// use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
/// use logitfit::function::{DifferentiableFunction, LogisticRegressionFunction};
///
/// let x = Tensor2D::<CpuBackend>::from_rows(&[vec![1.0], vec![-1.0]]);
/// let y = Tensor1D::<CpuBackend>::new(vec![1.0, 0.0]);
/// let f = LogisticRegressionFunction::new(&x, &y, 0.0).unwrap();
///
/// let (value, grad) = f.evaluate_with_gradient(&Tensor1D::zeros(2));
/// assert!((value - 2.0 * std::f64::consts::LN_2).abs() < 1e-12);
/// assert_eq!(grad.len(), 2);
/// ```
pub trait DifferentiableFunction<B: Backend> {
    /// Objective value at `parameters`.
    fn evaluate(&self, parameters: &Tensor1D<B>) -> f64;

    /// Gradient at `parameters`, same length as `parameters`.
    fn gradient(&self, parameters: &Tensor1D<B>) -> Tensor1D<B>;

    /// Value and gradient together. Implementors may share intermediate work.
    fn evaluate_with_gradient(&self, parameters: &Tensor1D<B>) -> (f64, Tensor1D<B>) {
        (self.evaluate(parameters), self.gradient(parameters))
    }
}

/// An objective that decomposes into a sum over observations.
///
/// Batch methods cover observations `[begin, begin + batch_size)`, clamped to
/// [`num_functions`](Self::num_functions). Summing a batch method over any
/// partition of the observations gives the full-data value.
pub trait SeparableFunction<B: Backend>: DifferentiableFunction<B> {
    /// Number of separable terms (observations).
    fn num_functions(&self) -> usize;

    /// Objective restricted to a contiguous batch of observations.
    fn evaluate_batch(&self, parameters: &Tensor1D<B>, begin: usize, batch_size: usize) -> f64;

    /// Gradient restricted to a contiguous batch of observations.
    fn gradient_batch(
        &self,
        parameters: &Tensor1D<B>,
        begin: usize,
        batch_size: usize,
    ) -> Tensor1D<B>;

    fn evaluate_with_gradient_batch(
        &self,
        parameters: &Tensor1D<B>,
        begin: usize,
        batch_size: usize,
    ) -> (f64, Tensor1D<B>) {
        (
            self.evaluate_batch(parameters, begin, batch_size),
            self.gradient_batch(parameters, begin, batch_size),
        )
    }
}
