use super::{limit_reached, Optimizer};
use crate::backend::{Backend, Scalar, Tensor1D};
use crate::callback::{self, Callback};
use crate::function::SeparableFunction;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::marker::PhantomData;

/// Mini-batch stochastic gradient descent over a [`SeparableFunction`].
///
/// Each update uses the mean gradient of one contiguous batch:
/// ```text
/// θ ← θ - η · (1/|b|) Σ_{i∈b} ∇fᵢ(θ)
/// ```
///
/// An epoch visits every batch once; with `shuffle` enabled the batch order
/// is permuted at the start of each epoch. `max_iterations` counts visited
/// observations (zero means no limit). Optimization also stops when the
/// summed batch objective of an epoch changes by less than `tolerance`, when
/// it stops being finite, or when a callback asks to stop.
///
/// Defaults: `step_size = 0.01`, `batch_size = 32`,
/// `max_iterations = 100_000`, `tolerance = 1e-5`, `shuffle = true`.
///
/// # Example
/// ```
/// use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
/// use logitfit::function::LogisticRegressionFunction;
/// use logitfit::optimizer::{Optimizer, SGD};
///
/// let x = Tensor2D::<CpuBackend>::from_rows(&[vec![-1.0], vec![-2.0], vec![1.0], vec![2.0]]);
/// let y = Tensor1D::<CpuBackend>::new(vec![0.0, 0.0, 1.0, 1.0]);
/// let f = LogisticRegressionFunction::new(&x, &y, 0.0).unwrap();
///
/// let mut theta = Tensor1D::zeros(2);
/// let mut sgd = SGD::<CpuBackend>::new().step_size(0.5).batch_size(2).max_iterations(400).seed(3);
/// sgd.optimize(&f, &mut theta, &mut []);
/// assert!(theta.get(1) > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct SGD<B: Backend> {
    pub step_size: f64,
    pub batch_size: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub shuffle: bool,
    seed: Option<u64>,
    _backend: PhantomData<B>,
}

impl<B: Backend> Default for SGD<B> {
    fn default() -> Self {
        Self {
            step_size: 0.01,
            batch_size: 32,
            max_iterations: 100_000,
            tolerance: 1e-5,
            shuffle: true,
            seed: None,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend> SGD<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    /// Sets the batch size; values below 1 are treated as 1.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
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

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Fixes the shuffling seed so runs are reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl<B, F> Optimizer<B, F> for SGD<B>
where
    B: Backend,
    F: SeparableFunction<B> + ?Sized,
{
    fn optimize(
        &mut self,
        function: &F,
        iterate: &mut Tensor1D<B>,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> f64 {
        callback::notify_begin(callbacks, iterate);

        let n = function.num_functions();
        let batch_size = self.batch_size.max(1);
        if n == 0 {
            tracing::warn!("objective has no separable terms; nothing to optimize");
            let objective = function.evaluate(iterate);
            callback::notify_end(callbacks, iterate, objective);
            return objective;
        }

        let mut rng = self.rng();
        let mut starts: Vec<usize> = (0..n).step_by(batch_size).collect();
        let mut visited = 0;
        let mut epoch = 0;
        let mut previous = f64::INFINITY;

        'epochs: loop {
            if self.shuffle {
                starts.shuffle(&mut rng);
            }

            let mut epoch_objective = 0.0;
            for &begin in &starts {
                if limit_reached(visited, self.max_iterations) {
                    tracing::info!(visited, epoch, "maximum iterations reached");
                    break 'epochs;
                }
                let effective = batch_size.min(n - begin);
                let (objective, gradient) =
                    function.evaluate_with_gradient_batch(iterate, begin, batch_size);
                callback::notify_evaluate(callbacks, iterate, objective);
                callback::notify_gradient(callbacks, iterate, &gradient);
                epoch_objective += objective;

                let scale = Scalar::<B>::new(-self.step_size / effective as f64);
                *iterate = iterate.add(&gradient.scale(&scale));
                visited += effective;

                if callback::notify_step(callbacks, iterate, objective) {
                    tracing::info!(visited, epoch, "callback requested termination");
                    break 'epochs;
                }
            }

            epoch += 1;
            tracing::debug!(epoch, objective = epoch_objective, "epoch finished");

            if callback::notify_epoch(callbacks, iterate, epoch, epoch_objective) {
                tracing::info!(epoch, "callback requested termination");
                break;
            }
            if !epoch_objective.is_finite() {
                tracing::warn!(epoch, "objective is not finite; terminating");
                break;
            }
            if (previous - epoch_objective).abs() < self.tolerance {
                tracing::info!(epoch, objective = epoch_objective, "objective change below tolerance");
                break;
            }
            previous = epoch_objective;
        }

        let objective = function.evaluate(iterate);
        callback::notify_end(callbacks, iterate, objective);
        objective
    }
}
