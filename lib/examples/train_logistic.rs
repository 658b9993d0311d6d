//! Trains a logistic regression classifier with each bundled optimizer.
//!
//! Labels follow `x1 + x2 > 3`, with one mislabeled observation so the
//! problem is not separable. Run with `RUST_LOG=debug` to see per-iteration
//! progress.

use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
use logitfit::callback::{EarlyStopAtMinLoss, PrintLoss};
use logitfit::model::{LogisticRegression, DEFAULT_DECISION_BOUNDARY};
use logitfit::optimizer::{GradientDescent, SGD, LBFGS};
use std::error::Error;
use tracing_subscriber::EnvFilter;

type Backend = CpuBackend;

fn create_data() -> (Tensor2D<Backend>, Tensor1D<Backend>) {
    let x = Tensor2D::from_rows(&[
        vec![1.0, 1.0],
        vec![1.0, 2.0],
        vec![2.0, 2.0],
        vec![3.0, 1.0],
        vec![0.5, 0.5],
        vec![1.0, 1.0], // noise: labelled positive
        vec![3.0, 3.0],
        vec![0.0, 1.0],
    ]);
    let y = Tensor1D::new(vec![0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
    (x, y)
}

fn report(name: &str, model: &LogisticRegression<Backend>, objective: f64) -> Result<(), Box<dyn Error>> {
    let (x, y) = create_data();
    let accuracy = model.compute_accuracy(&x, &y, DEFAULT_DECISION_BOUNDARY)?;
    let (label, probabilities) = model.classify_point_with_probabilities(
        &Tensor1D::new(vec![2.5, 2.0]),
        DEFAULT_DECISION_BOUNDARY,
    )?;
    println!(
        "{name:>16}: objective={objective:.5} accuracy={accuracy:.1}% bias={:.4} weights={:?}",
        model.bias(),
        model.weights().to_vec()
    );
    println!(
        "{:>16}  (2.5, 2.0) -> label {label}, P(y=1)={:.4}",
        "", probabilities[1]
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (x, y) = create_data();
    let lambda = 0.01;

    let mut model = LogisticRegression::<Backend>::new(2, lambda);
    let objective = model.train(&x, &y, &mut LBFGS::<Backend>::new(), &mut [])?;
    report("L-BFGS", &model, objective)?;

    let mut model = LogisticRegression::<Backend>::new(2, lambda);
    let mut early = EarlyStopAtMinLoss::new(20);
    let objective = model.train(
        &x,
        &y,
        &mut GradientDescent::<Backend>::new().step_size(0.1).max_iterations(20_000),
        &mut [&mut early],
    )?;
    report("gradient descent", &model, objective)?;

    let mut model = LogisticRegression::<Backend>::new(2, lambda);
    let mut print = PrintLoss::default();
    let objective = model.train(
        &x,
        &y,
        &mut SGD::<Backend>::new()
            .step_size(0.2)
            .batch_size(4)
            .max_iterations(8_000)
            .seed(42),
        &mut [&mut print],
    )?;
    report("SGD", &model, objective)?;

    Ok(())
}
