use super::{DifferentiableFunction, SeparableFunction};
use crate::backend::{Backend, Scalar, ScalarOps, Tensor1D, Tensor2D};
use crate::error::{LogitError, Result};

/// L2-regularized negative log-likelihood of a binary logistic model.
///
/// For parameters `θ = [b, w_1, .., w_d]` and observations `(x_i, y_i)`:
///
/// ```text
/// f(θ) = Σᵢ [ max(zᵢ, 0) - zᵢ·yᵢ + ln(1 + e^(-|zᵢ|)) ] + λ/2 · ‖w‖²,   zᵢ = b + w·xᵢ
/// ∇f(θ) = [ Σᵢ (σ(zᵢ) - yᵢ),  Xᵀ(σ(z) - y) + λ·w ]
/// ```
///
/// The summand is the logistic loss `-[y ln σ(z) + (1-y) ln(1-σ(z))]` in a form
/// that stays finite for any finite logit. The bias is not regularized.
///
/// The objective borrows its data; it never copies the full design matrix.
///
/// # Panics
/// Evaluation methods panic if `parameters.len() != num_features() + 1`.
#[derive(Clone, Debug)]
pub struct LogisticRegressionFunction<'a, B: Backend> {
    predictors: &'a Tensor2D<B>,
    responses: &'a Tensor1D<B>,
    lambda: f64,
}

impl<'a, B: Backend> LogisticRegressionFunction<'a, B> {
    /// Creates the objective over `predictors` (one row per observation) and
    /// `responses` (one 0/1 label per observation).
    ///
    /// # Errors
    /// [`LogitError::DimensionMismatch`] if there is not one response per row.
    pub fn new(
        predictors: &'a Tensor2D<B>,
        responses: &'a Tensor1D<B>,
        lambda: f64,
    ) -> Result<Self> {
        let rows = predictors.rows();
        if responses.len() != rows {
            return Err(LogitError::DimensionMismatch {
                expected: rows,
                got: responses.len(),
            });
        }
        Ok(Self {
            predictors,
            responses,
            lambda,
        })
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn num_features(&self) -> usize {
        self.predictors.cols()
    }

    pub fn predictors(&self) -> &'a Tensor2D<B> {
        self.predictors
    }

    pub fn responses(&self) -> &'a Tensor1D<B> {
        self.responses
    }

    fn split(&self, parameters: &Tensor1D<B>) -> (f64, Tensor1D<B>) {
        let d = self.num_features();
        assert_eq!(
            parameters.len(),
            d + 1,
            "Parameter vector must have num_features + 1 elements"
        );
        (parameters.get(0), parameters.slice(1..d + 1))
    }

    /// Clamped batch bounds and the share of the penalty the batch carries.
    fn batch_bounds(&self, begin: usize, batch_size: usize) -> (usize, usize, f64) {
        let n = self.num_functions();
        let end = begin.saturating_add(batch_size).min(n);
        let begin = begin.min(end);
        let share = if n == 0 {
            0.0
        } else {
            (end - begin) as f64 / n as f64
        };
        (begin, end, share)
    }

    fn penalty(&self, weights: &Tensor1D<B>, share: f64) -> f64 {
        0.5 * self.lambda * share * weights.squared_norm()
    }

    fn loss_on(
        &self,
        x: &Tensor2D<B>,
        y: &Tensor1D<B>,
        parameters: &Tensor1D<B>,
        share: f64,
    ) -> f64 {
        let (bias, weights) = self.split(parameters);
        let z = logits(x, bias, &weights);
        nll(&z, y) + self.penalty(&weights, share)
    }

    fn gradient_on(
        &self,
        x: &Tensor2D<B>,
        y: &Tensor1D<B>,
        parameters: &Tensor1D<B>,
        share: f64,
    ) -> Tensor1D<B> {
        let (bias, weights) = self.split(parameters);
        let z = logits(x, bias, &weights);
        self.assemble_gradient(x, &z, y, &weights, share)
    }

    fn loss_and_gradient_on(
        &self,
        x: &Tensor2D<B>,
        y: &Tensor1D<B>,
        parameters: &Tensor1D<B>,
        share: f64,
    ) -> (f64, Tensor1D<B>) {
        let (bias, weights) = self.split(parameters);
        let z = logits(x, bias, &weights);
        let value = nll(&z, y) + self.penalty(&weights, share);
        let grad = self.assemble_gradient(x, &z, y, &weights, share);
        (value, grad)
    }

    fn assemble_gradient(
        &self,
        x: &Tensor2D<B>,
        z: &Tensor1D<B>,
        y: &Tensor1D<B>,
        weights: &Tensor1D<B>,
        share: f64,
    ) -> Tensor1D<B> {
        let residual = z.sigmoid().sub(y);
        let bias_grad = Tensor1D::new(vec![residual.sum().to_f64()]);
        let weight_grad = x
            .tdot(&residual)
            .add(&weights.scale(&Scalar::new(self.lambda * share)));
        bias_grad.concat(&weight_grad)
    }
}

/// `b + X·w`, one logit per row.
fn logits<B: Backend>(x: &Tensor2D<B>, bias: f64, weights: &Tensor1D<B>) -> Tensor1D<B> {
    x.dot(weights).add_scalar(&Scalar::new(bias))
}

/// Summed logistic loss in softplus form.
fn nll<B: Backend>(z: &Tensor1D<B>, y: &Tensor1D<B>) -> f64 {
    let zero = B::Scalar::zero();
    let hinge = z.map(|v| v.max(zero)).sub(&z.mul(y));
    let soft = z.map(|v| (zero - v.abs()).exp().ln_1p());
    hinge.add(&soft).sum().to_f64()
}

impl<B: Backend> DifferentiableFunction<B> for LogisticRegressionFunction<'_, B> {
    fn evaluate(&self, parameters: &Tensor1D<B>) -> f64 {
        self.loss_on(self.predictors, self.responses, parameters, 1.0)
    }

    fn gradient(&self, parameters: &Tensor1D<B>) -> Tensor1D<B> {
        self.gradient_on(self.predictors, self.responses, parameters, 1.0)
    }

    fn evaluate_with_gradient(&self, parameters: &Tensor1D<B>) -> (f64, Tensor1D<B>) {
        self.loss_and_gradient_on(self.predictors, self.responses, parameters, 1.0)
    }
}

impl<B: Backend> SeparableFunction<B> for LogisticRegressionFunction<'_, B> {
    fn num_functions(&self) -> usize {
        self.predictors.rows()
    }

    fn evaluate_batch(&self, parameters: &Tensor1D<B>, begin: usize, batch_size: usize) -> f64 {
        let (begin, end, share) = self.batch_bounds(begin, batch_size);
        let x = self.predictors.slice_rows(begin..end);
        let y = self.responses.slice(begin..end);
        self.loss_on(&x, &y, parameters, share)
    }

    fn gradient_batch(
        &self,
        parameters: &Tensor1D<B>,
        begin: usize,
        batch_size: usize,
    ) -> Tensor1D<B> {
        let (begin, end, share) = self.batch_bounds(begin, batch_size);
        let x = self.predictors.slice_rows(begin..end);
        let y = self.responses.slice(begin..end);
        self.gradient_on(&x, &y, parameters, share)
    }

    fn evaluate_with_gradient_batch(
        &self,
        parameters: &Tensor1D<B>,
        begin: usize,
        batch_size: usize,
    ) -> (f64, Tensor1D<B>) {
        let (begin, end, share) = self.batch_bounds(begin, batch_size);
        let x = self.predictors.slice_rows(begin..end);
        let y = self.responses.slice(begin..end);
        self.loss_and_gradient_on(&x, &y, parameters, share)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rstest::rstest;

    fn toy_data() -> (Tensor2D<CpuBackend>, Tensor1D<CpuBackend>) {
        let x = Tensor2D::from_rows(&[
            vec![0.5, -1.2],
            vec![1.5, 0.3],
            vec![-0.7, 2.0],
            vec![2.2, -0.4],
            vec![-1.9, -0.8],
            vec![0.1, 1.1],
            vec![-0.3, 0.6],
        ]);
        let y = Tensor1D::new(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
        (x, y)
    }

    fn random_parameters(rng: &mut StdRng, len: usize) -> Tensor1D<CpuBackend> {
        Tensor1D::new((0..len).map(|_| rng.gen_range(-2.0..2.0)).collect())
    }

    #[test]
    fn test_new_rejects_mismatched_responses() {
        let (x, _) = toy_data();
        let y = Tensor1D::<CpuBackend>::new(vec![0.0, 1.0]);
        let err = LogisticRegressionFunction::new(&x, &y, 0.0).unwrap_err();
        assert!(matches!(
            err,
            LogitError::DimensionMismatch {
                expected: 7,
                got: 2
            }
        ));
    }

    #[test]
    fn test_evaluate_at_zero_is_n_ln2() {
        let (x, y) = toy_data();
        let f = LogisticRegressionFunction::new(&x, &y, 3.0).unwrap();
        let value = f.evaluate(&Tensor1D::zeros(3));
        assert_abs_diff_eq!(value, 7.0 * std::f64::consts::LN_2, epsilon = 1e-12);
    }

    #[test]
    fn test_evaluate_matches_textbook_form() {
        let (x, y) = toy_data();
        let lambda = 0.7;
        let f = LogisticRegressionFunction::new(&x, &y, lambda).unwrap();
        let theta = vec![0.3, -0.5, 1.25];

        let rows = x.to_vec();
        let labels = y.to_vec();
        let mut expected = 0.0;
        for (i, &yi) in labels.iter().enumerate() {
            let z = theta[0] + theta[1] * rows[2 * i] + theta[2] * rows[2 * i + 1];
            let s = 1.0 / (1.0 + (-z).exp());
            expected -= yi * s.ln() + (1.0 - yi) * (1.0 - s).ln();
        }
        expected += 0.5 * lambda * (theta[1] * theta[1] + theta[2] * theta[2]);

        assert_abs_diff_eq!(
            f.evaluate(&Tensor1D::new(theta)),
            expected,
            epsilon = 1e-10
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.1)]
    #[case(10.0)]
    fn test_gradient_matches_finite_differences(#[case] lambda: f64) {
        let (x, y) = toy_data();
        let f = LogisticRegressionFunction::new(&x, &y, lambda).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let h = 1e-6;

        for _ in 0..5 {
            let theta = random_parameters(&mut rng, 3);
            let grad = f.gradient(&theta).to_vec();
            let base = theta.to_vec();
            for j in 0..base.len() {
                let mut plus = base.clone();
                let mut minus = base.clone();
                plus[j] += h;
                minus[j] -= h;
                let numeric = (f.evaluate(&Tensor1D::new(plus))
                    - f.evaluate(&Tensor1D::new(minus)))
                    / (2.0 * h);
                assert_abs_diff_eq!(grad[j], numeric, epsilon = 1e-5 * (1.0 + numeric.abs()));
            }
        }
    }

    #[test]
    fn test_bias_is_not_regularized() {
        let (x, y) = toy_data();
        let theta = Tensor1D::<CpuBackend>::new(vec![4.0, 0.0, 0.0]);
        let plain = LogisticRegressionFunction::new(&x, &y, 0.0).unwrap();
        let heavy = LogisticRegressionFunction::new(&x, &y, 100.0).unwrap();
        assert_eq!(plain.evaluate(&theta), heavy.evaluate(&theta));
        assert_eq!(plain.gradient(&theta).get(0), heavy.gradient(&theta).get(0));
    }

    #[test]
    fn test_evaluate_non_decreasing_in_lambda() {
        let (x, y) = toy_data();
        let theta = Tensor1D::<CpuBackend>::new(vec![0.2, -1.0, 0.5]);
        let mut previous = f64::NEG_INFINITY;
        for lambda in [0.0, 0.01, 0.1, 1.0, 10.0, 100.0] {
            let f = LogisticRegressionFunction::new(&x, &y, lambda).unwrap();
            let value = f.evaluate(&theta);
            assert!(value >= previous, "objective decreased at lambda = {lambda}");
            previous = value;
        }
    }

    #[test]
    fn test_evaluate_with_gradient_agrees_with_separate_calls() {
        let (x, y) = toy_data();
        let f = LogisticRegressionFunction::new(&x, &y, 0.5).unwrap();
        let theta = Tensor1D::<CpuBackend>::new(vec![-0.1, 0.8, -0.3]);
        let (value, grad) = f.evaluate_with_gradient(&theta);
        assert_eq!(value, f.evaluate(&theta));
        assert_eq!(grad.to_vec(), f.gradient(&theta).to_vec());
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(7)]
    fn test_batches_sum_to_full_objective(#[case] batch_size: usize) {
        let (x, y) = toy_data();
        let f = LogisticRegressionFunction::new(&x, &y, 2.5).unwrap();
        let theta = Tensor1D::<CpuBackend>::new(vec![0.4, -0.6, 0.9]);

        let mut value = 0.0;
        let mut grad = Tensor1D::<CpuBackend>::zeros(3);
        let mut begin = 0;
        while begin < f.num_functions() {
            let (v, g) = f.evaluate_with_gradient_batch(&theta, begin, batch_size);
            value += v;
            grad = grad.add(&g);
            begin += batch_size;
        }

        assert_abs_diff_eq!(value, f.evaluate(&theta), epsilon = 1e-10);
        for (a, b) in grad.to_vec().iter().zip(f.gradient(&theta).to_vec()) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_batch_past_end_is_clamped() {
        let (x, y) = toy_data();
        let f = LogisticRegressionFunction::new(&x, &y, 1.0).unwrap();
        let theta = Tensor1D::<CpuBackend>::new(vec![0.1, 0.2, 0.3]);

        let tail = f.evaluate_batch(&theta, 5, 100);
        let exact = f.evaluate_batch(&theta, 5, 2);
        assert_eq!(tail, exact);

        assert_eq!(f.evaluate_batch(&theta, 50, 4), 0.0);
        assert_eq!(f.gradient_batch(&theta, 50, 4).to_vec(), vec![0.0; 3]);
    }

    #[test]
    fn test_empty_dataset_has_no_penalty_share() {
        let x = Tensor2D::<CpuBackend>::zeros(0, 2);
        let y = Tensor1D::<CpuBackend>::zeros(0);
        let f = LogisticRegressionFunction::new(&x, &y, 1.0).unwrap();
        let theta = Tensor1D::new(vec![0.0, 1.0, 1.0]);
        assert_eq!(f.evaluate_batch(&theta, 0, 10), 0.0);
        assert_eq!(f.evaluate(&theta), 1.0);
    }

    #[test]
    fn test_saturated_logits_stay_finite() {
        let x = Tensor2D::<CpuBackend>::from_rows(&[vec![1.0], vec![-1.0]]);
        // Confidently wrong on both observations.
        let y = Tensor1D::<CpuBackend>::new(vec![0.0, 1.0]);
        let f = LogisticRegressionFunction::new(&x, &y, 0.0).unwrap();
        let theta = Tensor1D::new(vec![0.0, 1000.0]);

        let value = f.evaluate(&theta);
        assert!(value.is_finite());
        assert_abs_diff_eq!(value, 2000.0, epsilon = 1e-9);

        let grad = f.gradient(&theta);
        assert!(grad.to_vec().iter().all(|g| g.is_finite()));
        assert_abs_diff_eq!(grad.get(1), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_confident_correct_logits_keep_their_loss() {
        let x = Tensor2D::<CpuBackend>::from_rows(&[vec![1.0], vec![-1.0]]);
        let y = Tensor1D::<CpuBackend>::new(vec![1.0, 0.0]);
        let f = LogisticRegressionFunction::new(&x, &y, 0.0).unwrap();

        for margin in [40.0, 200.0] {
            let value = f.evaluate(&Tensor1D::new(vec![0.0, margin]));
            assert!(value > 0.0, "loss vanished at margin {margin}");
            assert_relative_eq!(value, 2.0 * (-margin).exp(), max_relative = 1e-12);
        }
    }

    #[test]
    fn test_objective_is_sync() {
        fn assert_sync<T: Sync>() {}
        assert_sync::<LogisticRegressionFunction<'static, CpuBackend>>();
    }

    #[test]
    fn test_concurrent_evaluation_matches_sequential() {
        let (x, y) = toy_data();
        let f = LogisticRegressionFunction::new(&x, &y, 0.3).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let points: Vec<_> = (0..8).map(|_| random_parameters(&mut rng, 3)).collect();
        let sequential: Vec<f64> = points.iter().map(|p| f.evaluate(p)).collect();

        let concurrent: Vec<f64> = std::thread::scope(|s| {
            let handles: Vec<_> = points
                .iter()
                .map(|p| {
                    let f = &f;
                    s.spawn(move || f.evaluate(p))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(sequential, concurrent);
    }
}
