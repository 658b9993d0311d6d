//! Benchmark utilities for logitfit.
//!
//! Provides reproducible synthetic classification data so the benches do not
//! depend on external datasets.

use logitfit::backend::{Backend, Tensor1D, Tensor2D};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A labelled design matrix with one row per observation.
pub struct SyntheticDataset<B: Backend> {
    pub predictors: Tensor2D<B>,
    pub responses: Tensor1D<B>,
}

/// Draws `observations` rows of `features` uniform values in `[-1, 1)` and
/// labels each row by the sign of a fixed random hyperplane, flipping a
/// `noise` fraction of the labels.
pub fn synthetic<B: Backend>(
    observations: usize,
    features: usize,
    noise: f64,
    seed: u64,
) -> SyntheticDataset<B> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal: Vec<f64> = (0..features).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let offset: f64 = rng.gen_range(-0.1..0.1);

    let mut rows = Vec::with_capacity(observations);
    let mut labels = Vec::with_capacity(observations);
    for _ in 0..observations {
        let row: Vec<f64> = (0..features).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let margin: f64 = offset + row.iter().zip(&normal).map(|(x, w)| x * w).sum::<f64>();
        let mut label = if margin > 0.0 { 1.0 } else { 0.0 };
        if rng.gen_bool(noise) {
            label = 1.0 - label;
        }
        rows.push(row);
        labels.push(label);
    }

    SyntheticDataset {
        predictors: Tensor2D::from_rows(&rows),
        responses: Tensor1D::new(labels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logitfit::CpuBackend;

    #[test]
    fn test_synthetic_shape_and_labels() {
        let data = synthetic::<CpuBackend>(50, 4, 0.1, 1);
        assert_eq!(data.predictors.shape(), (50, 4));
        assert_eq!(data.responses.len(), 50);
        assert!(data.responses.to_vec().iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_synthetic_is_seeded() {
        let a = synthetic::<CpuBackend>(20, 3, 0.2, 9);
        let b = synthetic::<CpuBackend>(20, 3, 0.2, 9);
        assert_eq!(a.predictors.to_vec(), b.predictors.to_vec());
        assert_eq!(a.responses.to_vec(), b.responses.to_vec());
    }
}
