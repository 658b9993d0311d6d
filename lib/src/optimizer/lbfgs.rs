use super::{limit_reached, Optimizer};
use crate::backend::{Backend, Scalar, Tensor1D};
use crate::callback::{self, Callback};
use crate::function::DifferentiableFunction;
use std::collections::VecDeque;
use std::marker::PhantomData;

/// Limited-memory BFGS with a backtracking Armijo line search.
///
/// Keeps the last `num_basis` curvature pairs `(s, y)` and builds the search
/// direction with the two-loop recursion. Each line search starts from a
/// unit step and halves it until the Armijo condition
/// `f(θ + αd) <= f(θ) + c·α·∇f(θ)·d` holds.
///
/// Terminates when
/// - the gradient norm drops below `min_gradient_norm`,
/// - the relative objective decrease falls below `factr · ε`,
/// - the line search fails (the last accepted iterate is kept),
/// - a callback asks to stop,
/// - or `max_iterations` steps were taken (zero means no limit).
///
/// # Example
/// ```
/// use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
/// use logitfit::function::LogisticRegressionFunction;
/// use logitfit::optimizer::{Optimizer, LBFGS};
///
/// let x = Tensor2D::<CpuBackend>::from_rows(&[vec![-1.0], vec![1.0], vec![-0.5], vec![0.5]]);
/// let y = Tensor1D::<CpuBackend>::new(vec![0.0, 0.0, 1.0, 1.0]);
/// let f = LogisticRegressionFunction::new(&x, &y, 1.0).unwrap();
///
/// let mut theta = Tensor1D::zeros(2);
/// let objective = LBFGS::<CpuBackend>::new().optimize(&f, &mut theta, &mut []);
/// assert!(objective <= 4.0 * std::f64::consts::LN_2);
/// ```
#[derive(Debug, Clone)]
pub struct LBFGS<B: Backend> {
    pub num_basis: usize,
    pub max_iterations: usize,
    pub armijo_constant: f64,
    pub min_gradient_norm: f64,
    pub factr: f64,
    pub max_line_search_trials: usize,
    pub min_step: f64,
    _backend: PhantomData<B>,
}

impl<B: Backend> Default for LBFGS<B> {
    fn default() -> Self {
        Self {
            num_basis: 10,
            max_iterations: 10_000,
            armijo_constant: 1e-4,
            min_gradient_norm: 1e-6,
            factr: 1e-15,
            max_line_search_trials: 50,
            min_step: 1e-20,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> LBFGS<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored curvature pairs.
    pub fn num_basis(mut self, num_basis: usize) -> Self {
        self.num_basis = num_basis.max(1);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn armijo_constant(mut self, armijo_constant: f64) -> Self {
        self.armijo_constant = armijo_constant;
        self
    }

    pub fn min_gradient_norm(mut self, min_gradient_norm: f64) -> Self {
        self.min_gradient_norm = min_gradient_norm;
        self
    }

    pub fn factr(mut self, factr: f64) -> Self {
        self.factr = factr;
        self
    }

    pub fn max_line_search_trials(mut self, trials: usize) -> Self {
        self.max_line_search_trials = trials;
        self
    }

    pub fn min_step(mut self, min_step: f64) -> Self {
        self.min_step = min_step;
        self
    }
}

/// Curvature history for the two-loop recursion.
struct History<B: Backend> {
    pairs: VecDeque<(Tensor1D<B>, Tensor1D<B>, f64)>,
    capacity: usize,
}

impl<B: Backend> History<B> {
    fn new(capacity: usize) -> Self {
        Self {
            pairs: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Stores `(s, y)` when it has positive curvature.
    fn push(&mut self, s: Tensor1D<B>, y: Tensor1D<B>) {
        let sy = s.dot(&y).to_f64();
        if sy <= f64::EPSILON * y.squared_norm() {
            return;
        }
        if self.pairs.len() == self.capacity {
            self.pairs.pop_front();
        }
        self.pairs.push_back((s, y, 1.0 / sy));
    }

    /// Approximates `-H·g`.
    fn direction(&self, gradient: &Tensor1D<B>) -> Tensor1D<B> {
        let mut q = gradient.clone();
        let mut alphas = Vec::with_capacity(self.pairs.len());
        for (s, y, rho) in self.pairs.iter().rev() {
            let alpha = rho * s.dot(&q).to_f64();
            q = q.sub(&y.scale(&Scalar::new(alpha)));
            alphas.push(alpha);
        }

        let gamma = match self.pairs.back() {
            Some((s, y, _)) => s.dot(y).to_f64() / y.squared_norm(),
            None => 1.0,
        };
        let mut r = q.scale(&Scalar::new(gamma));

        for ((s, y, rho), alpha) in self.pairs.iter().zip(alphas.iter().rev()) {
            let beta = rho * y.dot(&r).to_f64();
            r = r.add(&s.scale(&Scalar::new(alpha - beta)));
        }
        r.scale(&Scalar::new(-1.0))
    }

    fn clear(&mut self) {
        self.pairs.clear();
    }
}

impl<B: Backend> LBFGS<B> {
    /// Backtracking search along `direction`. Returns the accepted point with
    /// its objective and gradient, or `None` if no step satisfied Armijo.
    fn line_search<F>(
        &self,
        function: &F,
        iterate: &Tensor1D<B>,
        objective: f64,
        gradient: &Tensor1D<B>,
        direction: &Tensor1D<B>,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> Option<(Tensor1D<B>, f64, Tensor1D<B>)>
    where
        F: DifferentiableFunction<B> + ?Sized,
    {
        let slope = gradient.dot(direction).to_f64();
        let mut step = 1.0;
        for _ in 0..self.max_line_search_trials {
            if step < self.min_step {
                break;
            }
            let candidate = iterate.add(&direction.scale(&Scalar::new(step)));
            let (value, grad) = function.evaluate_with_gradient(&candidate);
            callback::notify_evaluate(callbacks, &candidate, value);
            if value.is_finite() && value <= objective + self.armijo_constant * step * slope {
                callback::notify_gradient(callbacks, &candidate, &grad);
                return Some((candidate, value, grad));
            }
            step *= 0.5;
        }
        None
    }
}

impl<B, F> Optimizer<B, F> for LBFGS<B>
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

        let mut history = History::new(self.num_basis.max(1));
        let mut iteration = 0;
        loop {
            if limit_reached(iteration, self.max_iterations) {
                tracing::info!(iteration, objective, "maximum iterations reached");
                break;
            }
            let gradient_norm = gradient.squared_norm().sqrt();
            if gradient_norm < self.min_gradient_norm {
                tracing::info!(iteration, objective, gradient_norm, "gradient norm below threshold");
                break;
            }

            let mut direction = history.direction(&gradient);
            if gradient.dot(&direction).to_f64() >= 0.0 {
                // Not a descent direction: restart from steepest descent.
                history.clear();
                direction = gradient.scale(&Scalar::new(-1.0));
            }

            let Some((next, next_objective, next_gradient)) = self.line_search(
                function,
                iterate,
                objective,
                &gradient,
                &direction,
                callbacks,
            ) else {
                tracing::warn!(iteration, objective, "line search failed; keeping last iterate");
                break;
            };

            iteration += 1;
            let decrease = objective - next_objective;
            let scale = objective.abs().max(next_objective.abs()).max(1.0);

            history.push(next.sub(iterate), next_gradient.sub(&gradient));
            *iterate = next;
            objective = next_objective;
            gradient = next_gradient;
            tracing::debug!(iteration, objective, "L-BFGS step");

            if callback::notify_step(callbacks, iterate, objective) {
                tracing::info!(iteration, objective, "callback requested termination");
                break;
            }
            if decrease / scale <= self.factr * f64::EPSILON {
                tracing::info!(iteration, objective, "objective decrease below tolerance");
                break;
            }
        }

        callback::notify_end(callbacks, iterate, objective);
        objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use crate::callback::{MaxIterations, StoreBestCoordinates};
    use crate::optimizer::test_functions::Quadratic;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_defaults() {
        let lbfgs = LBFGS::<CpuBackend>::default();
        assert_eq!(lbfgs.num_basis, 10);
        assert_eq!(lbfgs.max_iterations, 10_000);
        assert_eq!(lbfgs.armijo_constant, 1e-4);
        assert_eq!(lbfgs.min_gradient_norm, 1e-6);
        assert_eq!(lbfgs.factr, 1e-15);
        assert_eq!(lbfgs.max_line_search_trials, 50);
        assert_eq!(lbfgs.min_step, 1e-20);
    }

    #[test]
    fn test_converges_on_quadratic() {
        let f = Quadratic::<CpuBackend>::new(vec![
            vec![1.0, 2.0, 3.0],
            vec![-1.0, 0.0, 5.0],
            vec![3.0, 1.0, -2.0],
        ]);
        let mut x = Tensor1D::zeros(3);
        let objective = LBFGS::<CpuBackend>::new().optimize(&f, &mut x, &mut []);

        let expected = f.minimizer();
        for (got, want) in x.to_vec().iter().zip(expected) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(objective, f.evaluate(&x), epsilon = 1e-12);
    }

    #[test]
    fn test_direction_without_history_is_steepest_descent() {
        let history = History::<CpuBackend>::new(5);
        let g = Tensor1D::new(vec![1.0, -2.0]);
        assert_eq!(history.direction(&g).to_vec(), vec![-1.0, 2.0]);
    }

    #[test]
    fn test_history_drops_oldest_pair() {
        let mut history = History::<CpuBackend>::new(2);
        for k in 1..=3 {
            let s = Tensor1D::new(vec![k as f64]);
            history.push(s.clone(), s);
        }
        assert_eq!(history.pairs.len(), 2);
        assert_eq!(history.pairs[0].0.to_vec(), vec![2.0]);
    }

    #[test]
    fn test_history_rejects_negative_curvature() {
        let mut history = History::<CpuBackend>::new(2);
        history.push(Tensor1D::new(vec![1.0]), Tensor1D::new(vec![-1.0]));
        assert!(history.pairs.is_empty());
    }

    #[test]
    fn test_callbacks_stop_and_observe() {
        let f = Quadratic::<CpuBackend>::new(vec![vec![4.0, -4.0], vec![0.0, 2.0]]);
        let mut x = Tensor1D::zeros(2);
        let mut cap = MaxIterations::new(1);
        let mut best = StoreBestCoordinates::<CpuBackend>::new();
        let objective = LBFGS::<CpuBackend>::new().optimize(&f, &mut x, &mut [&mut cap, &mut best]);

        assert_eq!(cap.steps(), 1);
        assert_eq!(best.best_objective(), Some(objective));
        assert_eq!(best.best_coordinates().map(|c| c.to_vec()), Some(x.to_vec()));
    }

    #[test]
    fn test_starts_at_minimum() {
        let f = Quadratic::<CpuBackend>::new(vec![vec![1.0], vec![3.0]]);
        let mut x = Tensor1D::new(vec![2.0]);
        let mut cap = MaxIterations::new(usize::MAX);
        LBFGS::<CpuBackend>::new().optimize(&f, &mut x, &mut [&mut cap]);
        assert_eq!(cap.steps(), 0);
        assert_eq!(x.to_vec(), vec![2.0]);
    }
}
