//! Trains a model, saves it to disk and checks that the restored copy scores
//! held-out data identically.

use logitfit::backend::{CpuBackend, Tensor1D, Tensor2D};
use logitfit::model::{InferenceModel, LogisticRegression, DEFAULT_DECISION_BOUNDARY};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use tracing_subscriber::EnvFilter;

type Backend = CpuBackend;

/// Labels follow `2·x1 - x2 > 0` with 10% of them flipped.
fn sample(n: usize, rng: &mut StdRng) -> (Tensor2D<Backend>, Tensor1D<Backend>) {
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for _ in 0..n {
        let x1: f64 = rng.gen_range(-2.0..2.0);
        let x2: f64 = rng.gen_range(-2.0..2.0);
        let mut label = if 2.0 * x1 - x2 > 0.0 { 1.0 } else { 0.0 };
        if rng.gen_bool(0.1) {
            label = 1.0 - label;
        }
        rows.push(vec![x1, x2]);
        labels.push(label);
    }
    (Tensor2D::from_rows(&rows), Tensor1D::new(labels))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut rng = StdRng::seed_from_u64(2024);
    let (train_x, train_y) = sample(500, &mut rng);
    let (test_x, test_y) = sample(200, &mut rng);

    let model = LogisticRegression::fit(&train_x, &train_y, 0.1)?;
    let accuracy = model.compute_accuracy(&test_x, &test_y, DEFAULT_DECISION_BOUNDARY)?;
    println!("trained: parameters={:?} test accuracy={accuracy:.2}%", model.parameters().to_vec());

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("logistic.bin");
    model.save_to_file(&path)?;
    println!("saved to {}", path.display());

    let restored = LogisticRegression::<Backend>::load_from_file(&path)?;
    let restored_accuracy =
        restored.compute_accuracy(&test_x, &test_y, DEFAULT_DECISION_BOUNDARY)?;
    println!("restored: test accuracy={restored_accuracy:.2}%");

    assert_eq!(accuracy.to_bits(), restored_accuracy.to_bits());
    Ok(())
}
