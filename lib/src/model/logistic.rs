//! Binary logistic regression trained through a pluggable optimizer.

use super::InferenceModel;
use crate::backend::{Backend, Scalar, Tensor1D, Tensor2D};
use crate::callback::Callback;
use crate::error::{LogitError, Result};
use crate::function::{DifferentiableFunction, LogisticRegressionFunction};
use crate::optimizer::{Optimizer, LBFGS};

/// Probability threshold used when callers have no calibrated boundary.
pub const DEFAULT_DECISION_BOUNDARY: f64 = 0.5;

/// Binary logistic regression.
///
/// The model owns a parameter vector `[b, w_1, .., w_d]` and an L2
/// regularization strength `λ`. Training builds a
/// [`LogisticRegressionFunction`] over the supplied data and hands it, together
/// with the parameter vector, to an [`Optimizer`], which updates the
/// parameters in place.
///
/// Predicted probability of the positive class for an observation `x`:
/// ```text
/// p(x) = σ(b + w·x)
/// ```
/// and the predicted label is `1` iff `p(x) >= decision_boundary`.
///
/// # Example
/// ```
/// use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
/// use logitfit::model::{LogisticRegression, DEFAULT_DECISION_BOUNDARY};
///
/// let x = Tensor2D::<CpuBackend>::from_rows(&[
///     vec![-2.0, 0.0],
///     vec![-1.0, 1.0],
///     vec![1.0, -1.0],
///     vec![2.0, 0.0],
/// ]);
/// let y = Tensor1D::<CpuBackend>::new(vec![0.0, 0.0, 1.0, 1.0]);
///
/// let model = LogisticRegression::fit(&x, &y, 0.1).unwrap();
/// let label = model
///     .classify_point(&Tensor1D::new(vec![5.0, 0.0]), DEFAULT_DECISION_BOUNDARY)
///     .unwrap();
/// assert_eq!(label, 1);
/// ```
#[derive(Clone, Debug)]
pub struct LogisticRegression<B: Backend> {
    parameters: Tensor1D<B>,
    lambda: f64,
}

/// Plain parameter representation used for persistence.
///
/// Fields are stored in this order at full `f64` precision.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SerializableLogisticParams {
    pub parameters: Vec<f64>,
    pub lambda: f64,
}

impl<B: Backend> From<&LogisticRegression<B>> for SerializableLogisticParams {
    fn from(model: &LogisticRegression<B>) -> Self {
        Self {
            parameters: model.parameters.to_vec(),
            lambda: model.lambda,
        }
    }
}

impl<B: Backend> TryFrom<SerializableLogisticParams> for LogisticRegression<B> {
    type Error = LogitError;

    fn try_from(params: SerializableLogisticParams) -> Result<Self> {
        Self::from_parameters(Tensor1D::new(params.parameters), params.lambda)
    }
}

impl<B: Backend> Default for LogisticRegression<B> {
    /// Zero features, no regularization. Parameters are sized on the first
    /// training call.
    fn default() -> Self {
        Self::new(0, 0.0)
    }
}

fn validate_lambda(lambda: f64) -> Result<()> {
    if lambda.is_finite() && lambda >= 0.0 {
        Ok(())
    } else {
        Err(LogitError::InvalidParameter(format!(
            "lambda must be finite and non-negative, got {lambda}"
        )))
    }
}

/// Checks one 0/1 response per row.
fn validate_responses<B: Backend>(predictors: &Tensor2D<B>, responses: &Tensor1D<B>) -> Result<()> {
    if responses.len() != predictors.rows() {
        return Err(LogitError::DimensionMismatch {
            expected: predictors.rows(),
            got: responses.len(),
        });
    }
    if let Some((index, value)) = responses
        .to_vec()
        .into_iter()
        .enumerate()
        .find(|&(_, v)| v != 0.0 && v != 1.0)
    {
        return Err(LogitError::InvalidLabel { index, value });
    }
    Ok(())
}

fn validate_decision_boundary(decision_boundary: f64) -> Result<()> {
    if (0.0..=1.0).contains(&decision_boundary) {
        Ok(())
    } else {
        Err(LogitError::InvalidParameter(format!(
            "decision boundary must lie in [0, 1], got {decision_boundary}"
        )))
    }
}

fn label_for(probability: f64, decision_boundary: f64) -> usize {
    usize::from(probability >= decision_boundary)
}

impl<B: Backend> LogisticRegression<B> {
    /// Creates an untrained model with `dimensionality` features: all
    /// `dimensionality + 1` parameters are zero.
    pub fn new(dimensionality: usize, lambda: f64) -> Self {
        Self {
            parameters: Tensor1D::zeros(dimensionality + 1),
            lambda,
        }
    }

    /// Creates a model from an explicit parameter vector `[b, w_1, .., w_d]`.
    ///
    /// # Errors
    /// [`LogitError::InvalidParameter`] if `parameters` is empty or `lambda` is
    /// negative or not finite.
    pub fn from_parameters(parameters: Tensor1D<B>, lambda: f64) -> Result<Self> {
        if parameters.is_empty() {
            return Err(LogitError::InvalidParameter(
                "parameter vector must contain at least the bias".to_string(),
            ));
        }
        validate_lambda(lambda)?;
        Ok(Self { parameters, lambda })
    }

    /// Trains a new model with the default optimizer and no callbacks.
    pub fn fit(predictors: &Tensor2D<B>, responses: &Tensor1D<B>, lambda: f64) -> Result<Self> {
        let mut model = Self::new(predictors.cols(), lambda);
        model.train_default(predictors, responses, &mut [])?;
        Ok(model)
    }

    /// Trains with the given optimizer instance, starting from the current
    /// parameters (re-zeroed if their length does not match the data).
    ///
    /// Returns the final objective value reported by the optimizer.
    ///
    /// # Errors
    /// - [`LogitError::DimensionMismatch`] if there is not one response per row
    /// - [`LogitError::InvalidLabel`] if a response is not 0 or 1
    /// - [`LogitError::InvalidParameter`] if the stored lambda is invalid
    pub fn train<O>(
        &mut self,
        predictors: &Tensor2D<B>,
        responses: &Tensor1D<B>,
        optimizer: &mut O,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> Result<f64>
    where
        O: for<'f> Optimizer<B, LogisticRegressionFunction<'f, B>>,
    {
        self.train_inner(predictors, responses, self.lambda, None, optimizer, callbacks)
    }

    /// Trains with a fresh [`LBFGS`] optimizer.
    pub fn train_default(
        &mut self,
        predictors: &Tensor2D<B>,
        responses: &Tensor1D<B>,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> Result<f64> {
        self.train_with::<LBFGS<B>>(predictors, responses, callbacks)
    }

    /// Trains with a default-configured instance of optimizer type `O`.
    ///
    /// ```
    /// use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
    /// use logitfit::model::LogisticRegression;
    /// use logitfit::optimizer::GradientDescent;
    ///
    /// let x = Tensor2D::<CpuBackend>::from_rows(&[vec![-1.0], vec![1.0]]);
    /// let y = Tensor1D::<CpuBackend>::new(vec![0.0, 1.0]);
    ///
    /// let mut model = LogisticRegression::new(1, 0.1);
    /// model
    ///     .train_with::<GradientDescent<CpuBackend>>(&x, &y, &mut [])
    ///     .unwrap();
    /// assert!(model.weights().get(0) > 0.0);
    /// ```
    pub fn train_with<O>(
        &mut self,
        predictors: &Tensor2D<B>,
        responses: &Tensor1D<B>,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> Result<f64>
    where
        O: Default + for<'f> Optimizer<B, LogisticRegressionFunction<'f, B>>,
    {
        let mut optimizer = O::default();
        self.train(predictors, responses, &mut optimizer, callbacks)
    }

    /// Trains with `lambda`, which replaces the stored value once the inputs
    /// are accepted. A rejected call leaves the model unchanged.
    pub fn train_with_lambda<O>(
        &mut self,
        predictors: &Tensor2D<B>,
        responses: &Tensor1D<B>,
        lambda: f64,
        optimizer: &mut O,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> Result<f64>
    where
        O: for<'f> Optimizer<B, LogisticRegressionFunction<'f, B>>,
    {
        self.train_inner(predictors, responses, lambda, None, optimizer, callbacks)
    }

    /// Trains starting from `initial_point` instead of the stored parameters.
    ///
    /// # Errors
    /// [`LogitError::InitialPointMismatch`] unless
    /// `initial_point.len() == predictors.cols() + 1`, plus the errors of
    /// [`train`](Self::train).
    pub fn train_from<O>(
        &mut self,
        predictors: &Tensor2D<B>,
        responses: &Tensor1D<B>,
        initial_point: &Tensor1D<B>,
        optimizer: &mut O,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> Result<f64>
    where
        O: for<'f> Optimizer<B, LogisticRegressionFunction<'f, B>>,
    {
        self.train_inner(
            predictors,
            responses,
            self.lambda,
            Some(initial_point),
            optimizer,
            callbacks,
        )
    }

    fn train_inner<O>(
        &mut self,
        predictors: &Tensor2D<B>,
        responses: &Tensor1D<B>,
        lambda: f64,
        initial_point: Option<&Tensor1D<B>>,
        optimizer: &mut O,
        callbacks: &mut [&mut dyn Callback<B>],
    ) -> Result<f64>
    where
        O: for<'f> Optimizer<B, LogisticRegressionFunction<'f, B>>,
    {
        validate_lambda(lambda)?;
        validate_responses(predictors, responses)?;

        let (observations, features) = predictors.shape();
        if let Some(point) = initial_point {
            if point.len() != features + 1 {
                return Err(LogitError::InitialPointMismatch {
                    expected: features + 1,
                    got: point.len(),
                });
            }
        }

        self.lambda = lambda;
        match initial_point {
            Some(point) => self.parameters = point.clone(),
            None if self.parameters.len() != features + 1 => {
                tracing::debug!(
                    from = self.dimensionality(),
                    to = features,
                    "resizing parameters to match the data"
                );
                self.parameters = Tensor1D::zeros(features + 1);
            }
            None => {}
        }

        if observations == 0 {
            tracing::warn!(features, "training called without observations; skipping optimization");
            return Ok(0.0);
        }

        let function = LogisticRegressionFunction::new(predictors, responses, self.lambda)?;
        let objective = optimizer.optimize(&function, &mut self.parameters, callbacks);
        tracing::info!(
            objective,
            observations,
            features,
            lambda = self.lambda,
            "training finished"
        );
        Ok(objective)
    }

    /// Checks that the parameters hold a bias plus one weight per feature.
    fn check_features(&self, features: usize) -> Result<()> {
        if self.parameters.is_empty() {
            return Err(LogitError::DimensionMismatch {
                expected: features + 1,
                got: 0,
            });
        }
        let expected = self.dimensionality();
        if features != expected {
            return Err(LogitError::DimensionMismatch {
                expected,
                got: features,
            });
        }
        Ok(())
    }

    /// `σ(b + X·w)`, one probability per row.
    fn positive_probabilities(&self, dataset: &Tensor2D<B>) -> Result<Tensor1D<B>> {
        self.check_features(dataset.cols())?;
        let logits = dataset
            .dot(&self.weights())
            .add_scalar(&Scalar::new(self.bias()));
        Ok(logits.sigmoid())
    }

    /// Predicted labels and class probabilities for every row of `dataset`.
    ///
    /// The probability matrix has one row per observation: column 0 holds
    /// `1 - p`, column 1 holds `p`. Labels are derived from column 1.
    ///
    /// # Errors
    /// - [`LogitError::InvalidParameter`] if `decision_boundary` is not in
    ///   `[0, 1]`
    /// - [`LogitError::DimensionMismatch`] if `dataset` does not have
    ///   [`dimensionality`](Self::dimensionality) columns
    pub fn classify_with_probabilities(
        &self,
        dataset: &Tensor2D<B>,
        decision_boundary: f64,
    ) -> Result<(Vec<usize>, Tensor2D<B>)> {
        validate_decision_boundary(decision_boundary)?;
        let positive = self.positive_probabilities(dataset)?;
        let labels = positive
            .to_vec()
            .into_iter()
            .map(|p| label_for(p, decision_boundary))
            .collect();
        let negative = positive
            .scale(&Scalar::new(-1.0))
            .add_scalar(&Scalar::new(1.0));
        Ok((labels, Tensor2D::from_columns(&[negative, positive])))
    }

    /// Predicted label for every row of `dataset`.
    pub fn classify(&self, dataset: &Tensor2D<B>, decision_boundary: f64) -> Result<Vec<usize>> {
        self.classify_with_probabilities(dataset, decision_boundary)
            .map(|(labels, _)| labels)
    }

    /// Class probabilities for every row of `dataset`.
    #[deprecated(note = "use `classify_with_probabilities`, which returns labels and probabilities together")]
    pub fn probabilities(&self, dataset: &Tensor2D<B>) -> Result<Tensor2D<B>> {
        self.classify_with_probabilities(dataset, DEFAULT_DECISION_BOUNDARY)
            .map(|(_, probabilities)| probabilities)
    }

    /// Predicted label and `[1 - p, p]` for a single observation.
    pub fn classify_point_with_probabilities(
        &self,
        point: &Tensor1D<B>,
        decision_boundary: f64,
    ) -> Result<(usize, [f64; 2])> {
        validate_decision_boundary(decision_boundary)?;
        self.check_features(point.len())?;
        let row = Tensor2D::new(point.to_vec(), 1, point.len());
        let (labels, probabilities) = self.classify_with_probabilities(&row, decision_boundary)?;
        let p = probabilities.to_vec();
        Ok((labels[0], [p[0], p[1]]))
    }

    /// Predicted label for a single observation.
    pub fn classify_point(&self, point: &Tensor1D<B>, decision_boundary: f64) -> Result<usize> {
        self.classify_point_with_probabilities(point, decision_boundary)
            .map(|(label, _)| label)
    }

    /// Unregularized negative log-likelihood of the data at the current
    /// parameters.
    pub fn compute_error(&self, predictors: &Tensor2D<B>, responses: &Tensor1D<B>) -> Result<f64> {
        self.check_features(predictors.cols())?;
        validate_responses(predictors, responses)?;
        let function = LogisticRegressionFunction::new(predictors, responses, 0.0)?;
        Ok(function.evaluate(&self.parameters))
    }

    /// Percentage of rows whose predicted label equals the response, in
    /// `[0, 100]`.
    ///
    /// # Errors
    /// [`LogitError::EmptyDataset`] if there are no rows, plus boundary, shape
    /// and label errors.
    pub fn compute_accuracy(
        &self,
        predictors: &Tensor2D<B>,
        responses: &Tensor1D<B>,
        decision_boundary: f64,
    ) -> Result<f64> {
        validate_decision_boundary(decision_boundary)?;
        validate_responses(predictors, responses)?;
        let observations = predictors.rows();
        if observations == 0 {
            return Err(LogitError::EmptyDataset);
        }
        let labels = self.classify(predictors, decision_boundary)?;
        let correct = labels
            .iter()
            .zip(responses.to_vec())
            .filter(|&(&label, response)| label as f64 == response)
            .count();
        Ok(100.0 * correct as f64 / observations as f64)
    }

    /// Zeroes every parameter; the dimensionality is kept.
    pub fn reset(&mut self) {
        self.parameters = Tensor1D::zeros(self.parameters.len());
    }

    pub fn parameters(&self) -> &Tensor1D<B> {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Tensor1D<B> {
        &mut self.parameters
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn set_lambda(&mut self, lambda: f64) {
        self.lambda = lambda;
    }

    /// Number of features (parameters minus the bias).
    pub fn dimensionality(&self) -> usize {
        self.parameters.len().saturating_sub(1)
    }

    pub fn bias(&self) -> f64 {
        if self.parameters.is_empty() {
            0.0
        } else {
            self.parameters.get(0)
        }
    }

    pub fn weights(&self) -> Tensor1D<B> {
        let len = self.parameters.len();
        if len == 0 {
            Tensor1D::zeros(0)
        } else {
            self.parameters.slice(1..len)
        }
    }
}

impl<B: Backend> InferenceModel<B> for LogisticRegression<B> {
    type InputSingle = Tensor1D<B>;
    type OutputSingle = usize;
    type InputBatch = Tensor2D<B>;
    type OutputBatch = Vec<usize>;
    type ParamsRepr = SerializableLogisticParams;

    /// Label at [`DEFAULT_DECISION_BOUNDARY`].
    fn predict(&self, input: &Self::InputSingle) -> Result<Self::OutputSingle> {
        self.classify_point(input, DEFAULT_DECISION_BOUNDARY)
    }

    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Self::OutputBatch> {
        self.classify(input, DEFAULT_DECISION_BOUNDARY)
    }

    fn extract_params(&self) -> Self::ParamsRepr {
        self.into()
    }

    fn from_params(params: Self::ParamsRepr) -> Result<Self> {
        Self::try_from(params)
    }
}
