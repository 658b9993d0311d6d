use super::{limit_reached, Optimizer};
use crate::backend::{Backend, Scalar, Tensor1D};
use crate::callback::{self, Callback};
use crate::function::DifferentiableFunction;
use std::marker::PhantomData;

/// Full-batch gradient descent with a fixed step:
/// ```text
/// θ ← θ - η · ∇f(θ)
/// ```
///
/// Stops when the objective changes by less than `tolerance` between two
/// iterations, after `max_iterations` steps (zero means no limit), when the
/// objective stops being finite, or when a callback asks to stop.
///
/// Defaults: `step_size = 0.01`, `max_iterations = 100_000`,
/// `tolerance = 1e-5`.
#[derive(Debug, Clone)]
pub struct GradientDescent<B: Backend> {
    pub step_size: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    _backend: PhantomData<B>,
}

impl<B: Backend> Default for GradientDescent<B> {
    fn default() -> Self {
        Self {
            step_size: 0.01,
            max_iterations: 100_000,
            tolerance: 1e-5,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> GradientDescent<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

impl<B, F> Optimizer<B, F> for GradientDescent<B>
where
    B: Backend,
    F: DifferentiableFunction<B> + ?Sized,
{
    fn optimize(
        &mut self,
        function: &F,
        iterate: &mut Tensor1D<B>,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> f64 {
        callback::notify_begin(callbacks, iterate);

        let (mut objective, mut gradient) = function.evaluate_with_gradient(iterate);
        callback::notify_evaluate(callbacks, iterate, objective);
        callback::notify_gradient(callbacks, iterate, &gradient);

        let neg_step = Scalar::<B>::new(-self.step_size);
        let mut iteration = 0;
        while !limit_reached(iteration, self.max_iterations) {
            iteration += 1;
            let previous = objective;

            *iterate = iterate.add(&gradient.scale(&neg_step));
            (objective, gradient) = function.evaluate_with_gradient(iterate);
            callback::notify_evaluate(callbacks, iterate, objective);
            callback::notify_gradient(callbacks, iterate, &gradient);
            tracing::debug!(iteration, objective, "gradient descent step");

            if !objective.is_finite() {
                tracing::warn!(iteration, "objective is not finite; terminating");
                break;
            }
            if callback::notify_step(callbacks, iterate, objective) {
                tracing::info!(iteration, objective, "callback requested termination");
                break;
            }
            if (previous - objective).abs() < self.tolerance {
                tracing::info!(iteration, objective, "objective change below tolerance");
                break;
            }
        }
        if limit_reached(iteration, self.max_iterations) {
            tracing::info!(iteration, objective, "maximum iterations reached");
        }

        callback::notify_end(callbacks, iterate, objective);
        objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::callback::MaxIterations;
    use crate::optimizer::test_functions::Quadratic;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_defaults() {
        let gd = GradientDescent::<CpuBackend>::default();
        assert_eq!(gd.step_size, 0.01);
        assert_eq!(gd.max_iterations, 100_000);
        assert_eq!(gd.tolerance, 1e-5);
    }

    #[test]
    fn test_builder_setters() {
        let gd = GradientDescent::<CpuBackend>::new()
            .step_size(0.5)
            .max_iterations(10)
            .tolerance(1e-9);
        assert_eq!(gd.step_size, 0.5);
        assert_eq!(gd.max_iterations, 10);
        assert_eq!(gd.tolerance, 1e-9);
    }

    #[test]
    fn test_converges_on_quadratic() {
        let f = Quadratic::<CpuBackend>::new(vec![vec![1.0, -2.0], vec![3.0, 0.0]]);
        let mut x = Tensor1D::zeros(2);
        let mut gd = GradientDescent::<CpuBackend>::new().step_size(0.1).tolerance(1e-14);
        let objective = gd.optimize(&f, &mut x, &mut []);

        let expected = f.minimizer();
        assert_abs_diff_eq!(x.get(0), expected[0], epsilon = 1e-6);
        assert_abs_diff_eq!(x.get(1), expected[1], epsilon = 1e-6);
        assert_abs_diff_eq!(objective, f.evaluate(&x), epsilon = 1e-12);
    }

    #[test]
    fn test_callback_stops_early() {
        let f = Quadratic::<CpuBackend>::new(vec![vec![10.0]]);
        let mut x = Tensor1D::zeros(1);
        let mut cap = MaxIterations::new(3);
        let mut gd = GradientDescent::<CpuBackend>::new().step_size(0.01).tolerance(0.0);
        gd.optimize(&f, &mut x, &mut [&mut cap]);

        assert_eq!(cap.steps(), 3);
        // Three steps of x ← x + 0.01·(10 - x).
        let expected = 10.0 * (1.0 - 0.99f64.powi(3));
        assert_abs_diff_eq!(x.get(0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_max_iterations_bounds_steps() {
        let f = Quadratic::<CpuBackend>::new(vec![vec![10.0]]);
        let mut x = Tensor1D::zeros(1);
        let mut cap = MaxIterations::new(usize::MAX);
        let mut gd = GradientDescent::<CpuBackend>::new().max_iterations(7).tolerance(0.0);
        gd.optimize(&f, &mut x, &mut [&mut cap]);
        assert_eq!(cap.steps(), 7);
    }
}
