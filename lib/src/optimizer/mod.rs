//! # Optimizers
//!
//! An [`Optimizer`] minimizes an objective starting from a caller-owned
//! parameter vector, mutating it in place and returning the final objective
//! value. The model depends only on this trait, so any algorithm can be
//! plugged in:
//!
//! | Optimizer           | Objective bound             | Default for model |
//! |---------------------|-----------------------------|-------------------|
//! | [`LBFGS`]           | [`DifferentiableFunction`]  | yes               |
//! | [`GradientDescent`] | [`DifferentiableFunction`]  |                   |
//! | [`SGD`]             | [`SeparableFunction`]       |                   |
//!
//! All bundled optimizers are configured through consuming builder setters:
//!
//! ```rust
//! use logitfit::backend::CpuBackend;
//! use logitfit::optimizer::SGD;
//!
//! let sgd = SGD::<CpuBackend>::new()
//!     .step_size(0.05)
//!     .batch_size(16)
//!     .seed(42);
//! assert_eq!(sgd.batch_size, 16);
//! ```
//!
//! [`DifferentiableFunction`]: crate::function::DifferentiableFunction
//! [`SeparableFunction`]: crate::function::SeparableFunction

use crate::backend::{Backend, Tensor1D};
use crate::callback::Callback;

mod gradient_descent;
mod lbfgs;
mod sgd;

pub use gradient_descent::GradientDescent;
pub use lbfgs::LBFGS;
pub use sgd::SGD;

/// Minimizes an objective of type `F` over parameter vectors of backend `B`.
///
/// # Contract
/// - `iterate` holds the starting point on entry and the final point on exit.
/// - The return value is the objective at the final `iterate`.
/// - Every callback is notified of every event, in order; a callback's stop
///   request takes effect after the whole slice has been notified.
pub trait Optimizer<B: Backend, F: ?Sized> {
    fn optimize(
        &mut self,
        function: &F,
        iterate: &mut Tensor1D<B>,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> f64;
}

/// `true` once `iteration` reaches `max_iterations`; zero means no limit.
pub(crate) fn limit_reached(iteration: usize, max_iterations: usize) -> bool {
    max_iterations != 0 && iteration >= max_iterations
}
